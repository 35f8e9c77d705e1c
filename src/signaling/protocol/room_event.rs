/// Collaboration payloads fanned out to the other occupants of a room.
///
/// The relay never interprets these; `test_cases` in particular is whatever
/// serialized form the clients agree on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    CodeUpdate { code: String },
    LanguageUpdate { language: String },
    ChatMessage { sender_name: String, text: String },
    QuestionSend { question: String, test_cases: Vec<u8> },
    QuestionClear,
    TestResultUpdate { test_cases: Vec<u8> },
    TimerStart { time_left_secs: u32 },
    TimerStop,
    TimerReset,
    PlayerCode { code: String },
    PlayerIo { input: String, output: String },
    ProctorAlert { kind: String, message: String },
}

impl RoomEvent {
    pub fn tag(&self) -> u8 {
        use RoomEvent::*;
        match self {
            CodeUpdate { .. } => 0x01,
            LanguageUpdate { .. } => 0x02,
            ChatMessage { .. } => 0x03,
            QuestionSend { .. } => 0x04,
            QuestionClear => 0x05,
            TestResultUpdate { .. } => 0x06,
            TimerStart { .. } => 0x07,
            TimerStop => 0x08,
            TimerReset => 0x09,
            PlayerCode { .. } => 0x0A,
            PlayerIo { .. } => 0x0B,
            ProctorAlert { .. } => 0x0C,
        }
    }

    pub fn name(&self) -> &'static str {
        use RoomEvent::*;
        match self {
            CodeUpdate { .. } => "CodeUpdate",
            LanguageUpdate { .. } => "LanguageUpdate",
            ChatMessage { .. } => "ChatMessage",
            QuestionSend { .. } => "QuestionSend",
            QuestionClear => "QuestionClear",
            TestResultUpdate { .. } => "TestResultUpdate",
            TimerStart { .. } => "TimerStart",
            TimerStop => "TimerStop",
            TimerReset => "TimerReset",
            PlayerCode { .. } => "PlayerCode",
            PlayerIo { .. } => "PlayerIo",
            ProctorAlert { .. } => "ProctorAlert",
        }
    }
}
