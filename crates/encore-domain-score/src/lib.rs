pub mod midi_import;
pub mod model;
pub mod pitch;
pub mod tempo;

pub use midi_import::*;
pub use model::*;
pub use pitch::*;
pub use tempo::*;
