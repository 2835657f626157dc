pub mod player_progress;

pub mod prelude {
    pub use super::player_progress::Entity as PlayerProgress;
}
