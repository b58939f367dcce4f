pub mod types;
pub mod error;
pub mod encoding;
pub mod ops;
pub mod validator;
pub mod runtime;
pub mod builder;

pub use types::*;
pub use error::*;
pub use encoding::*;
pub use ops::*;
pub use validator::*;
pub use runtime::*;
pub use builder::*;
