pub mod advisory;
pub mod domain;
pub mod narration;
pub mod ports;
pub mod route_gate;
pub mod treatments;
pub mod weather;

pub use advisory::{AdvisoryClient, AdvisoryError, AdvisoryPolicy};
pub use domain::{ChatRole, ChatTurn, Diagnosis, Language, NewUser, User, UserCredentials};
pub use ports::{
    ChatService, DiagnosisService, PortError, PortResult, TextGenerationService,
    TextToSpeechService, UserStore, WeatherService,
};
