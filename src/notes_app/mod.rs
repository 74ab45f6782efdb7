mod error;
mod models;
mod notes_app;
mod notes_repository;
mod session;

pub use self::models::Account;
pub use self::notes_app::App;
pub use self::notes_repository::NotesRepository;
pub use self::session::SessionController;
