//! Note lifecycle and the visual attributes derived from it.

pub mod dispatcher;
pub mod note;
pub mod style;

pub use dispatcher::{FadeTimer, FadeToken, NoteDispatcher, BASE_FADE};
pub use note::{ActiveNote, NoteSnapshot, NoteState};
pub use style::{velocity_to_radius, ColorScheme, Rgb, VisualizationStyle};
