pub mod assembler;
pub mod escalator;
pub mod fallback;
pub mod links;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod validator;
