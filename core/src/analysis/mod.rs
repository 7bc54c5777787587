pub use hint::*;
pub use observation::*;

mod hint;
mod observation;
