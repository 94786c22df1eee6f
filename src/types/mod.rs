mod blob;
mod clob;
mod decimal;
mod integer;
mod list;
mod r#struct;
mod timestamp;
mod value;

pub use self::blob::*;
pub use self::clob::*;
pub use self::decimal::*;
pub use self::integer::*;
pub use self::list::*;
pub use self::r#struct::*;
pub use self::timestamp::*;
pub use self::value::*;
