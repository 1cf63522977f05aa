pub mod dispatcher;
pub mod host;
pub mod input;
pub mod safety;
pub mod text_input;
