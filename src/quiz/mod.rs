pub mod equation;
pub mod history;

pub use equation::{Answer, Equation, EquationError, Operator};
pub use history::History;
