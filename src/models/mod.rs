mod account;
mod attempt;
mod hint;
mod kid;
mod progress;
mod story;

pub use account::*;
pub use attempt::*;
pub use hint::*;
pub use kid::*;
pub use progress::*;
pub use story::*;
