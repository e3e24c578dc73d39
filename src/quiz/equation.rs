use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Operands are drawn from `0..OPERAND_BOUND`.
pub const OPERAND_BOUND: i32 = 10;
const OPERATOR_CATEGORIES: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquationError {
    #[error("no answer has been submitted for this equation yet")]
    AnswerNotSet,
    #[error("the equation was already answered with {0}")]
    AlreadyAnswered(i32),
    #[error("division by zero is not a valid equation")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Maps a category drawn from `0..4` to an operator.
    /// Division is only used when the divisor is non zero, otherwise addition takes its place.
    pub fn from_category(category: u8, operand2: i32) -> Self {
        match category {
            0 => Operator::Add,
            1 => Operator::Subtract,
            2 => Operator::Multiply,
            3 if operand2 != 0 => Operator::Divide,
            _ => Operator::Add,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Integer arithmetic widened to `i64`, so any pair of `i32` operands fits.
    /// Division truncates toward zero. Returns `None` only on a zero divisor.
    pub fn apply(&self, lhs: i32, rhs: i32) -> Option<i64> {
        let (lhs, rhs) = (i64::from(lhs), i64::from(rhs));
        match self {
            Operator::Add => Some(lhs + rhs),
            Operator::Subtract => Some(lhs - rhs),
            Operator::Multiply => Some(lhs * rhs),
            Operator::Divide => lhs.checked_div(rhs),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Answer {
    #[default]
    Unanswered,
    Answered(i32),
}

/// A simple math equation and, once submitted, its answer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Equation {
    operand1: i32,
    operand2: i32,
    operator: Operator,
    answer: Answer,
}

impl Equation {
    pub fn new(operand1: i32, operand2: i32, operator: Operator) -> Result<Self, EquationError> {
        if operator == Operator::Divide && operand2 == 0 {
            return Err(EquationError::DivisionByZero);
        }
        Ok(Self {
            operand1,
            operand2,
            operator,
            answer: Answer::Unanswered,
        })
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let operand1 = rng.gen_range(0..OPERAND_BOUND);
        let operand2 = rng.gen_range(0..OPERAND_BOUND);
        let operator = Operator::from_category(rng.gen_range(0..OPERATOR_CATEGORIES), operand2);

        return Self {
            operand1,
            operand2,
            operator,
            answer: Answer::Unanswered,
        };
    }

    pub fn operand1(&self) -> i32 {
        self.operand1
    }

    pub fn operand2(&self) -> i32 {
        self.operand2
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }

    /// The text shown to the user before answering, e.g. `3 + 4`.
    pub fn question(&self) -> String {
        format!("{} {} {}", self.operand1, self.operator, self.operand2)
    }

    pub fn set_answer(&mut self, value: i32) -> Result<(), EquationError> {
        if let Answer::Answered(previous) = self.answer {
            return Err(EquationError::AlreadyAnswered(previous));
        }
        self.answer = Answer::Answered(value);
        Ok(())
    }

    fn submitted(&self) -> Result<i32, EquationError> {
        match self.answer {
            Answer::Answered(value) => Ok(value),
            Answer::Unanswered => Err(EquationError::AnswerNotSet),
        }
    }

    pub fn is_correct(&self) -> Result<bool, EquationError> {
        let submitted = self.submitted()?;
        let expected = self
            .operator
            .apply(self.operand1, self.operand2)
            .ok_or(EquationError::DivisionByZero)?;

        Ok(expected == i64::from(submitted))
    }

    /// Canonical form: `<operand1> <operator> <operand2> = <answer> (correct|wrong)`.
    pub fn render(&self) -> Result<String, EquationError> {
        let submitted = self.submitted()?;
        let verdict = if self.is_correct()? { "correct" } else { "wrong" };

        Ok(format!("{} = {} ({})", self.question(), submitted, verdict))
    }
}
