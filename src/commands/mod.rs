pub mod inspect;
pub mod serve;
pub mod top;
