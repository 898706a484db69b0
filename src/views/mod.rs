pub mod game;
pub mod message;

pub use game::{GameView, GAME_VIEW};
pub use message::{show_message, MessageView, MESSAGE_VIEW};
