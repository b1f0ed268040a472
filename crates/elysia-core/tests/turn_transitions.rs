//! Turn-level behaviour of the session machine, driven purely by events.

use elysia_core::{
    AudioClip, ChannelStatus, Effect, Emotion, Frame, FrameAnalysis, Role, SessionEvent,
    SessionMachine, SessionState, VisionChatReply, VoiceReply,
};

fn open_machine() -> SessionMachine {
    let mut machine = SessionMachine::new(SessionState::new("welcome"));
    machine.handle(SessionEvent::ChannelConnecting);
    machine.handle(SessionEvent::ChannelOpened);
    assert_eq!(machine.channel_status(), ChannelStatus::Open);
    machine
}

fn chat_response(text: &str, emotion: &str) -> SessionEvent {
    SessionEvent::ChannelMessage(format!(
        r#"{{"type":"chat_response","text":"{text}","emotion":"{emotion}"}}"#
    ))
}

#[test]
fn blank_text_is_a_no_op() {
    let mut machine = open_machine();
    for blank in ["", "   ", "\n\t"] {
        let effects = machine.handle(SessionEvent::TextSubmitted(blank.to_string()));
        assert!(effects.is_empty());
    }
    assert_eq!(machine.state().messages().len(), 1);
    assert!(!machine.state().is_typing());
}

#[test]
fn send_text_goes_over_the_channel() {
    let mut machine = open_machine();
    let effects = machine.handle(SessionEvent::TextSubmitted("hello".to_string()));
    assert_eq!(
        effects,
        vec![Effect::SendChat {
            text: "hello".to_string()
        }]
    );
    let state = machine.state();
    assert!(state.is_typing());
    let last = state.last_message().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "hello");
    assert!(last.timestamp.is_some());
}

#[test]
fn n_chat_turns_grow_the_log_by_2n_in_alternation() {
    let mut machine = open_machine();
    let n = 5;
    for i in 0..n {
        machine.handle(SessionEvent::TextSubmitted(format!("question {i}")));
        machine.handle(chat_response(&format!("answer {i}"), "curious"));
    }
    let messages = machine.state().messages();
    assert_eq!(messages.len(), 1 + 2 * n);
    for (i, pair) in messages[1..].chunks(2).enumerate() {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[0].content, format!("question {i}"));
        assert_eq!(pair[1].role, Role::Agent);
        assert_eq!(pair[1].content, format!("answer {i}"));
    }
}

#[test]
fn chat_response_updates_state_and_speaks() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::TextSubmitted("hey".to_string()));
    let effects = machine.handle(chat_response("Hi", "happy"));

    let state = machine.state();
    assert!(!state.is_typing());
    let last = state.last_message().unwrap();
    assert_eq!(last.role, Role::Agent);
    assert_eq!(last.content, "Hi");
    assert_eq!(state.emotion(), &Emotion::Happy);
    assert_eq!(
        effects,
        vec![Effect::Speak {
            text: "Hi".to_string()
        }]
    );
}

#[test]
fn malformed_channel_payloads_are_dropped() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::TextSubmitted("hey".to_string()));
    let before = machine.state().clone();
    for raw in ["{", r#"{"type":"chat_response"}"#, r#"{"type":"mystery"}"#] {
        let effects = machine.handle(SessionEvent::ChannelMessage(raw.to_string()));
        assert!(effects.is_empty());
    }
    assert_eq!(machine.state(), &before);
}

#[test]
fn backend_error_frame_clears_typing_without_a_message() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::TextSubmitted("hey".to_string()));
    let len = machine.state().messages().len();
    machine.handle(SessionEvent::ChannelMessage(
        r#"{"type":"error","text":"I'm having trouble"}"#.to_string(),
    ));
    assert!(!machine.state().is_typing());
    assert_eq!(machine.state().messages().len(), len);
}

#[test]
fn closed_channel_rolls_back_typing() {
    let mut machine = SessionMachine::new(SessionState::new("welcome"));
    let effects = machine.handle(SessionEvent::TextSubmitted("anyone?".to_string()));
    assert!(effects.is_empty());
    assert!(!machine.state().is_typing());
    // The user message itself is still part of the log.
    assert_eq!(machine.state().messages().len(), 2);
}

#[test]
fn channel_drop_during_chat_turn_clears_typing() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::TextSubmitted("hi".to_string()));
    assert!(machine.state().is_typing());
    assert_eq!(machine.pending_chats(), 1);

    let effects = machine.handle(SessionEvent::ChannelClosed);
    assert!(effects.is_empty());
    assert!(!machine.state().is_typing());
    assert_eq!(machine.pending_chats(), 0);
    assert_eq!(machine.state().messages().len(), 2);
}

#[test]
fn answered_chats_are_not_pending() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::TextSubmitted("one".to_string()));
    machine.handle(SessionEvent::TextSubmitted("two".to_string()));
    assert_eq!(machine.pending_chats(), 2);
    machine.handle(chat_response("first", "happy"));
    machine.handle(SessionEvent::ChannelMessage(r#"{"type":"error","text":"busy"}"#.to_string()));
    assert_eq!(machine.pending_chats(), 0);
}

#[test]
fn channel_drop_leaves_vision_chat_turn_busy() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::CameraToggled);
    machine.handle(SessionEvent::FrameCaptured(Frame::jpeg(vec![1, 2, 3])));
    let effects = machine.handle(SessionEvent::TextSubmitted("look".to_string()));
    assert!(matches!(effects.as_slice(), [Effect::VisionChat { .. }]));

    machine.handle(SessionEvent::ChannelClosed);
    assert!(machine.state().is_typing());
    assert_eq!(machine.pending_chats(), 0);
}

#[test]
fn camera_mode_uses_vision_chat_once() {
    let mut machine = open_machine();
    assert_eq!(machine.handle(SessionEvent::CameraToggled), vec![Effect::StartCapture]);
    let frame = Frame::jpeg(vec![1, 2, 3]);
    let effects = machine.handle(SessionEvent::FrameCaptured(frame.clone()));
    assert_eq!(effects, vec![Effect::AnalyzeFrame(frame.clone())]);

    let effects = machine.handle(SessionEvent::TextSubmitted("what do you see?".to_string()));
    assert_eq!(
        effects,
        vec![Effect::VisionChat {
            text: "what do you see?".to_string(),
            frame
        }]
    );

    let effects = machine.handle(SessionEvent::VisionChatReplied(VisionChatReply {
        response: "A cat".to_string(),
        emotion: Some(Emotion::Loving),
    }));
    assert_eq!(
        effects,
        vec![Effect::Speak {
            text: "A cat".to_string()
        }]
    );
    assert_eq!(machine.state().emotion(), &Emotion::Loving);
    assert!(!machine.state().is_typing());
}

#[test]
fn camera_mode_without_a_frame_uses_the_channel() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::CameraToggled);
    let effects = machine.handle(SessionEvent::TextSubmitted("hi".to_string()));
    assert_eq!(
        effects,
        vec![Effect::SendChat {
            text: "hi".to_string()
        }]
    );
}

#[test]
fn vision_chat_failure_falls_back_to_channel() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::CameraToggled);
    machine.handle(SessionEvent::FrameCaptured(Frame::jpeg(vec![9])));
    machine.handle(SessionEvent::TextSubmitted("look".to_string()));

    let effects = machine.handle(SessionEvent::VisionChatFailed {
        text: "look".to_string(),
        reason: "503".to_string(),
    });
    assert_eq!(
        effects,
        vec![Effect::SendChat {
            text: "look".to_string()
        }]
    );
    assert!(machine.state().is_typing());
    // Only the user message so far; the fallback did not duplicate it.
    assert_eq!(machine.state().messages().len(), 2);
}

#[test]
fn vision_chat_keeps_emotion_when_absent() {
    let mut machine = open_machine();
    machine.handle(chat_response("first", "sad"));
    machine.handle(SessionEvent::VisionChatReplied(VisionChatReply {
        response: "second".to_string(),
        emotion: None,
    }));
    assert_eq!(machine.state().emotion(), &Emotion::Sad);
}

#[test]
fn camera_off_discards_frames() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::CameraToggled);
    machine.handle(SessionEvent::FrameCaptured(Frame::jpeg(vec![1])));
    assert_eq!(machine.handle(SessionEvent::CameraToggled), vec![Effect::StopCapture]);
    assert!(machine.latest_frame().is_none());
    assert!(machine
        .handle(SessionEvent::FrameCaptured(Frame::jpeg(vec![2])))
        .is_empty());
}

#[test]
fn voice_turn_appends_user_then_agent() {
    let mut machine = open_machine();
    assert_eq!(machine.handle(SessionEvent::ListeningToggled), vec![Effect::StartRecording]);
    assert!(machine.state().is_listening());
    assert_eq!(machine.handle(SessionEvent::ListeningToggled), vec![Effect::StopRecording]);

    let clip = AudioClip::wav(vec![0; 64]);
    let effects = machine.handle(SessionEvent::VoiceCaptured(clip.clone()));
    assert_eq!(effects, vec![Effect::Transcribe(clip)]);
    assert!(machine.state().is_typing());

    let effects = machine.handle(SessionEvent::VoiceReplied(VoiceReply {
        user_text: "how are you".to_string(),
        response: "wonderful".to_string(),
    }));
    let messages = machine.state().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "how are you");
    assert_eq!(messages[2].role, Role::Agent);
    assert_eq!(messages[2].content, "wonderful");
    assert!(!machine.state().is_typing());
    assert_eq!(
        effects,
        vec![Effect::Speak {
            text: "wonderful".to_string()
        }]
    );
}

#[test]
fn voice_input_mid_capture_cancels_the_recording() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::ListeningToggled);
    assert!(machine.state().is_listening());

    let clip = AudioClip::wav(vec![7; 32]);
    let effects = machine.handle(SessionEvent::VoiceCaptured(clip.clone()));
    assert_eq!(effects, vec![Effect::CancelRecording, Effect::Transcribe(clip)]);
    assert!(!machine.state().is_listening());

    assert_eq!(machine.handle(SessionEvent::ListeningToggled), vec![Effect::StartRecording]);
}

#[test]
fn failed_voice_turn_leaves_log_untouched() {
    let mut machine = open_machine();
    let before = machine.state().messages().to_vec();
    machine.handle(SessionEvent::VoiceCaptured(AudioClip::wav(vec![1, 2])));
    assert!(machine.state().is_typing());
    let effects = machine.handle(SessionEvent::VoiceFailed("connection refused".to_string()));
    assert!(effects.is_empty());
    assert!(!machine.state().is_typing());
    assert_eq!(machine.state().messages(), before.as_slice());
}

#[test]
fn recording_failure_resets_listening() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::ListeningToggled);
    machine.handle(SessionEvent::RecordingFailed("permission denied".to_string()));
    assert!(!machine.state().is_listening());
}

#[test]
fn vision_analysis_does_not_disturb_pending_chat() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::CameraToggled);
    machine.handle(SessionEvent::TextSubmitted("tell me a story".to_string()));
    let messages_before = machine.state().messages().len();

    let effects = machine.handle(SessionEvent::VisionAnalyzed(FrameAnalysis {
        analysis: "A person at a desk".to_string(),
    }));
    assert!(effects.is_empty());
    assert_eq!(machine.state().vision_analysis(), Some("A person at a desk"));
    assert!(machine.state().is_typing());
    assert_eq!(machine.state().messages().len(), messages_before);

    machine.handle(chat_response("Once upon a time", "happy"));
    assert!(!machine.state().is_typing());
    assert_eq!(machine.state().vision_analysis(), Some("A person at a desk"));
}

#[test]
fn overlapping_playbacks_keep_speaking_until_the_last_ends() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::SpeechStarted);
    machine.handle(SessionEvent::SpeechStarted);
    assert_eq!(machine.active_playbacks(), 2);
    machine.handle(SessionEvent::SpeechEnded);
    assert!(machine.state().is_speaking());
    machine.handle(SessionEvent::SpeechEnded);
    assert!(!machine.state().is_speaking());
    machine.handle(SessionEvent::SpeechEnded);
    assert_eq!(machine.active_playbacks(), 0);
}

#[test]
fn listening_and_speaking_are_independent() {
    let mut machine = open_machine();
    machine.handle(SessionEvent::SpeechStarted);
    machine.handle(SessionEvent::ListeningToggled);
    assert!(machine.state().is_speaking());
    assert!(machine.state().is_listening());
}

#[test]
fn speak_request_ignores_blank_text() {
    let mut machine = open_machine();
    assert!(machine
        .handle(SessionEvent::SpeakRequested("  ".to_string()))
        .is_empty());
    assert_eq!(
        machine.handle(SessionEvent::SpeakRequested("hi".to_string())),
        vec![Effect::Speak {
            text: "hi".to_string()
        }]
    );
}
