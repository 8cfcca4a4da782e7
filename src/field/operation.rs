//! Arithmetic expressions over recorded fields.

use super::{reference_units_of_field, title_of_field, FieldOperation};
use crate::{bail_io, io::fdt, io_error};
use ndarray::prelude::*;
use std::{collections::HashMap, fmt, io, ops::Range};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(fdt),
    Identifier(String, Range<usize>),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

fn tokenize(expression: &str) -> io::Result<Vec<Token>> {
    let chars: Vec<(usize, char)> = expression.char_indices().collect();
    let end_of = |idx: usize| chars.get(idx).map_or(expression.len(), |&(pos, _)| pos);

    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let (start, c) = chars[idx];
        match c {
            c if c.is_whitespace() => {
                idx += 1;
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LeftParen,
                    _ => Token::RightParen,
                });
                idx += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = idx;
                while end < chars.len() {
                    let c = chars[end].1;
                    let is_exponent_sign = (c == '+' || c == '-')
                        && end > idx
                        && matches!(chars[end - 1].1, 'e' | 'E');
                    if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || is_exponent_sign
                    {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text = &expression[start..end_of(end)];
                let value = text.parse::<fdt>().map_err(|err| {
                    io_error!(
                        InvalidInput,
                        "Invalid number {} in expression {}: {}",
                        text,
                        expression,
                        err
                    )
                })?;
                tokens.push(Token::Number(value));
                idx = end;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = idx;
                while end < chars.len() && (chars[end].1.is_alphanumeric() || chars[end].1 == '_')
                {
                    end += 1;
                }
                let range = start..end_of(end);
                tokens.push(Token::Identifier(expression[range.clone()].to_string(), range));
                idx = end;
            }
            c => bail_io!(
                InvalidInput,
                "Invalid character {} in expression {}",
                c,
                expression
            ),
        }
    }
    Ok(tokens)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Clone, Debug, PartialEq)]
enum Expression {
    Constant(fdt),
    Field(usize),
    Negate(Box<Expression>),
    Binary(BinaryOperator, Box<Expression>, Box<Expression>),
}

/// Recursive descent parser for field expressions.
struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    position: usize,
    field_names: Vec<String>,
    field_spans: Vec<(usize, Range<usize>)>,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> io::Result<Self> {
        Ok(Self {
            expression,
            tokens: tokenize(expression)?,
            position: 0,
            field_names: Vec::new(),
            field_spans: Vec::new(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn error(&self, message: &str) -> io::Error {
        io_error!(
            InvalidInput,
            "Invalid expression {}: {}",
            self.expression,
            message
        )
    }

    fn parse(mut self) -> io::Result<(Expression, Vec<String>, Vec<(usize, Range<usize>)>)> {
        if self.tokens.is_empty() {
            return Err(self.error("expression is empty"));
        }
        let expression = self.parse_sum()?;
        if self.position < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok((expression, self.field_names, self.field_spans))
    }

    fn parse_sum(&mut self) -> io::Result<Expression> {
        let mut expression = self.parse_product()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => return Ok(expression),
            };
            self.position += 1;
            let rhs = self.parse_product()?;
            expression = Expression::Binary(operator, Box::new(expression), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> io::Result<Expression> {
        let mut expression = self.parse_unary()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => return Ok(expression),
            };
            self.position += 1;
            let rhs = self.parse_unary()?;
            expression = Expression::Binary(operator, Box::new(expression), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> io::Result<Expression> {
        match self.peek() {
            Some(Token::Minus) => {
                self.position += 1;
                Ok(Expression::Negate(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.position += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> io::Result<Expression> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expression::Constant(value)),
            Some(Token::Identifier(name, span)) => {
                let index = match self.field_names.iter().position(|field| field == &name) {
                    Some(index) => index,
                    None => {
                        self.field_names.push(name);
                        self.field_names.len() - 1
                    }
                };
                self.field_spans.push((index, span));
                Ok(Expression::Field(index))
            }
            Some(Token::LeftParen) => {
                let expression = self.parse_sum()?;
                match self.next() {
                    Some(Token::RightParen) => Ok(expression),
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            Some(_) => Err(self.error("expected a number, field or opening parenthesis")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Product of reference unit labels raised to integer powers.
#[derive(Clone, Debug, Default, PartialEq)]
struct Units {
    factors: Vec<(String, i32)>,
}

impl Units {
    fn parse(units: &str) -> Self {
        let mut parsed = Self::default();
        for factor in units.split('*').map(str::trim).filter(|f| !f.is_empty()) {
            parsed.add_factor(factor, 1);
        }
        parsed
    }

    fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    fn add_factor(&mut self, name: &str, power: i32) {
        if let Some(idx) = self.factors.iter().position(|(factor, _)| factor == name) {
            self.factors[idx].1 += power;
            if self.factors[idx].1 == 0 {
                self.factors.remove(idx);
            }
        } else if power != 0 {
            self.factors.push((name.to_string(), power));
        }
    }

    fn combined(&self, other: &Self, sign: i32) -> Self {
        let mut combined = self.clone();
        for (factor, power) in &other.factors {
            combined.add_factor(factor, sign * power);
        }
        combined
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format_factors = |positive: bool| -> Vec<String> {
            self.factors
                .iter()
                .filter(|(_, power)| (*power > 0) == positive)
                .map(|(factor, power)| match power.abs() {
                    1 => factor.clone(),
                    power => format!("{}^{}", factor, power),
                })
                .collect()
        };
        let numerator = format_factors(true);
        let denominator = format_factors(false);
        if numerator.is_empty() && denominator.is_empty() {
            return Ok(());
        }
        if numerator.is_empty() {
            f.write_str("1")?;
        } else {
            f.write_str(&numerator.join("*"))?;
        }
        match denominator.len() {
            0 => Ok(()),
            1 => write!(f, "/{}", denominator[0]),
            _ => write!(f, "/({})", denominator.join("*")),
        }
    }
}

enum Evaluated {
    Scalar(fdt),
    Array(Array1<fdt>),
}

impl Evaluated {
    fn apply(self, other: Self, operator: BinaryOperator) -> Self {
        let op = |a: fdt, b: fdt| match operator {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
        };
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(op(a, b)),
            (Self::Array(mut a), Self::Scalar(b)) => {
                a.mapv_inplace(|a| op(a, b));
                Self::Array(a)
            }
            (Self::Scalar(a), Self::Array(mut b)) => {
                b.mapv_inplace(|b| op(a, b));
                Self::Array(b)
            }
            (Self::Array(mut a), Self::Array(b)) => {
                a.zip_mut_with(&b, |a, &b| *a = op(*a, b));
                Self::Array(a)
            }
        }
    }
}

/// Quantity given by an arithmetic expression over recorded field names,
/// such as `Ex`, `Bx*Bx + By*By` or `-(Rho_ele + Rho_ion)/2`.
#[derive(Clone, Debug)]
pub struct Operation {
    expression_text: String,
    expression: Expression,
    field_names: Vec<String>,
    field_units: Vec<String>,
    title: String,
    units: String,
}

impl Operation {
    /// Parses the given expression over the given available fields.
    pub fn new(
        expression_text: &str,
        available_fields: &[String],
        is_time_integral: bool,
    ) -> io::Result<Self> {
        if expression_text.trim().is_empty() {
            bail_io!(
                InvalidInput,
                "Argument `field` not provided\n\
                 Available fields: {}",
                available_fields.join(", ")
            );
        }
        let (expression, field_names, field_spans) = Parser::new(expression_text)?.parse()?;
        if field_names.is_empty() {
            bail_io!(
                InvalidInput,
                "Expression {} does not contain any fields\n\
                 Available fields: {}",
                expression_text,
                available_fields.join(", ")
            );
        }
        if let Some(name) = field_names
            .iter()
            .find(|name| !available_fields.contains(name))
        {
            bail_io!(
                InvalidInput,
                "No field `{}` found\n\
                 Available fields: {}",
                name,
                available_fields.join(", ")
            );
        }

        let field_units: Vec<String> = field_names
            .iter()
            .map(|name| reference_units_of_field(name, is_time_integral))
            .collect();

        let mut title = String::new();
        let mut copied_until = 0;
        for (index, span) in &field_spans {
            title.push_str(&expression_text[copied_until..span.start]);
            title.push_str(&title_of_field(&field_names[*index], is_time_integral));
            copied_until = span.end;
        }
        title.push_str(&expression_text[copied_until..]);
        let title = title.trim().to_string();

        let parsed_units: Vec<Units> = field_units.iter().map(|u| Units::parse(u)).collect();
        let units = Self::compute_units(&expression, &parsed_units).to_string();

        Ok(Self {
            expression_text: expression_text.trim().to_string(),
            expression,
            field_names,
            field_units,
            title,
            units,
        })
    }

    /// Returns the expression as given.
    pub fn expression(&self) -> &str {
        &self.expression_text
    }

    fn compute_units(expression: &Expression, field_units: &[Units]) -> Units {
        match expression {
            Expression::Constant(_) => Units::default(),
            Expression::Field(index) => field_units[*index].clone(),
            Expression::Negate(operand) => Self::compute_units(operand, field_units),
            Expression::Binary(operator, lhs, rhs) => {
                let lhs = Self::compute_units(lhs, field_units);
                let rhs = Self::compute_units(rhs, field_units);
                match operator {
                    BinaryOperator::Add | BinaryOperator::Subtract => {
                        if lhs.is_dimensionless() {
                            rhs
                        } else {
                            lhs
                        }
                    }
                    BinaryOperator::Multiply => lhs.combined(&rhs, 1),
                    BinaryOperator::Divide => lhs.combined(&rhs, -1),
                }
            }
        }
    }

    fn evaluate_expression(expression: &Expression, values: &[&Array1<fdt>]) -> Evaluated {
        match expression {
            Expression::Constant(value) => Evaluated::Scalar(*value),
            Expression::Field(index) => Evaluated::Array(values[*index].clone()),
            Expression::Negate(operand) => match Self::evaluate_expression(operand, values) {
                Evaluated::Scalar(value) => Evaluated::Scalar(-value),
                Evaluated::Array(array) => Evaluated::Array(-array),
            },
            Expression::Binary(operator, lhs, rhs) => Self::evaluate_expression(lhs, values)
                .apply(Self::evaluate_expression(rhs, values), *operator),
        }
    }
}

impl FieldOperation for Operation {
    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn evaluate(&self, values: &HashMap<String, Array1<fdt>>) -> io::Result<Array1<fdt>> {
        let field_values = self
            .field_names
            .iter()
            .map(|name| {
                values.get(name).ok_or_else(|| {
                    io_error!(
                        InvalidInput,
                        "Missing values for field {} in expression {}",
                        name,
                        self.expression_text
                    )
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        let length = field_values[0].len();
        if field_values.iter().any(|array| array.len() != length) {
            bail_io!(
                InvalidInput,
                "Values for fields in expression {} have different lengths",
                self.expression_text
            );
        }
        Ok(
            match Self::evaluate_expression(&self.expression, &field_values) {
                Evaluated::Scalar(value) => Array1::from_elem(length, value),
                Evaluated::Array(array) => array,
            },
        )
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn units_of(&self, field_name: &str) -> Option<String> {
        self.field_names
            .iter()
            .position(|name| name == field_name)
            .map(|index| self.field_units[index].clone())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn fields() -> Vec<String> {
        ["Ex", "Ey", "Bz", "Rho_ion", "Rho_ele"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn values() -> HashMap<String, Array1<fdt>> {
        let mut values = HashMap::new();
        values.insert("Ex".to_string(), array![1.0, 2.0, 3.0]);
        values.insert("Ey".to_string(), array![0.5, -1.0, 2.0]);
        values.insert("Rho_ion".to_string(), array![4.0, 4.0, 4.0]);
        values.insert("Rho_ele".to_string(), array![-3.0, -2.0, -1.0]);
        values
    }

    #[test]
    fn single_field_operation_works() {
        let operation = Operation::new("Ex", &fields(), false).unwrap();
        assert_eq!(operation.field_names(), &["Ex".to_string()]);
        assert_eq!(operation.title(), "Ex");
        assert_eq!(operation.units(), "E_r");
        assert_eq!(operation.evaluate(&values()).unwrap(), array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn arithmetic_respects_precedence() {
        let operation = Operation::new("-(Ex + 2*Ey) / 2 - 1e0", &fields(), false).unwrap();
        assert_eq!(
            operation.field_names(),
            &["Ex".to_string(), "Ey".to_string()]
        );
        let result = operation.evaluate(&values()).unwrap();
        assert_abs_diff_eq!(result[0], -2.0);
        assert_abs_diff_eq!(result[1], -1.0);
        assert_abs_diff_eq!(result[2], -4.5);
    }

    #[test]
    fn units_combine_through_expression() {
        let fields = fields();
        assert_eq!(
            Operation::new("Ex*Ey", &fields, false).unwrap().units(),
            "E_r^2"
        );
        assert_eq!(
            Operation::new("(Rho_ion + Rho_ele)/Ex", &fields, false)
                .unwrap()
                .units(),
            "Q_r*N_r/E_r"
        );
        assert_eq!(Operation::new("Ex/Ex", &fields, false).unwrap().units(), "");
        assert_eq!(
            Operation::new("2/Bz", &fields, false).unwrap().units(),
            "1/B_r"
        );
    }

    #[test]
    fn time_integrated_fields_are_labelled() {
        let operation = Operation::new("Ex + Ey", &fields(), true).unwrap();
        assert_eq!(
            operation.title(),
            "Time-integrated Ex + Time-integrated Ey"
        );
        assert_eq!(operation.units(), "E_r*T_r");
        assert_eq!(operation.units_of("Ey"), Some("E_r*T_r".to_string()));
        assert_eq!(operation.units_of("Bz"), None);
    }

    #[test]
    fn invalid_expressions_are_rejected() {
        let fields = fields();
        for expression in ["", "Ex +", "(Ex", "Ex Ey", "3", "Ex $ 2", "Ux"] {
            let err = Operation::new(expression, &fields, false).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
        let err = Operation::new("Ux", &fields, false).unwrap_err();
        assert!(err.to_string().contains("Available fields: Ex, Ey, Bz"));
    }

    #[test]
    fn missing_values_are_reported() {
        let operation = Operation::new("Bz", &fields(), false).unwrap();
        assert!(operation.evaluate(&values()).is_err());
    }
}
