// Application layer - Use case interactors

pub mod container;
pub mod edit_interactor;
pub mod export_interactor;
pub mod inspect_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use edit_interactor::EditInteractor;
pub use export_interactor::ExportInteractor;
pub use inspect_interactor::InspectInteractor;
