//! DIMACS CNF parser
//!
//! Reads the input formula into the clause database and collects the
//! counting directives from the preamble: `c t pmc|wmc|pwmc` declares
//! projected and/or weighted counting, `c p show v… 0` enumerates the data
//! variables, and `c p weight ℓ q 0` attaches a rational weight to a
//! literal.

use crate::{
    clause::{Clause, ClauseType},
    clausedatabase::ClauseDatabase,
    error::{CheckFailure, FailureKind, Result},
    input::{Input, Token},
    literal::{Literal, Variable},
    memory::{Offset, Vector},
    number::Number,
    output::Logger,
};
use std::{
    fs::File,
    io::{BufReader, Read},
};

/// Everything the checker needs to know about the input formula, except the
/// clauses themselves (those live in the clause database).
#[derive(Debug, Default)]
pub struct CnfFormula {
    /// Number of input variables, from the header.
    pub variables: u32,
    /// Number of input clauses, from the header.
    pub clauses: u32,
    /// Projected counting was declared (`pmc` or `pwmc`).
    pub projected: bool,
    /// Weighted counting was declared (`wmc` or `pwmc`).
    pub weighted: bool,
    /// Show (data) variables, indexed by variable.
    pub show: Vector<bool>,
    /// Whether an explicit show list was given.
    pub show_declared: bool,
    /// Weight of the positive literal, indexed by variable.
    pub positive_weight: Vector<Option<Number>>,
    /// Weight of the negative literal, indexed by variable.
    pub negative_weight: Vector<Option<Number>>,
}

impl CnfFormula {
    /// Whether a variable is counted over (true for every input variable
    /// unless projection restricts the domain).
    pub fn is_show(&self, var: Variable) -> bool {
        !self.projected || self.show[var.as_offset()]
    }
    /// The number of variables in the counting domain.
    pub fn data_variable_count(&self) -> u32 {
        if self.projected {
            let mut count = 0;
            for var in 1..=self.variables {
                if self.show[var as usize] {
                    count += 1;
                }
            }
            count
        } else {
            self.variables
        }
    }
}

/// Open a file as a token reader.
pub fn open_input(filename: &str) -> Result<Input<'static>> {
    let file = File::open(filename).map_err(|err| {
        CheckFailure::new(
            FailureKind::Io,
            filename,
            0,
            "open_input",
            format!("Couldn't open file '{}': {}", filename, err),
        )
    })?;
    Ok(Input::new(
        Box::new(BufReader::new(file).bytes().map(read_byte)),
        filename,
    ))
}

/// Unwrap a byte read; IO errors after a successful open are unrecoverable.
fn read_byte(result: std::io::Result<u8>) -> u8 {
    result.unwrap_or_else(|error| {
        as_error!(puts!("ERROR. {}\n", error));
        std::process::exit(1);
    })
}

/// Parse a CNF file: header, preamble directives, and clauses.
///
/// The clauses are stored with ids `1..=C` and type `Input`.
pub fn parse_cnf(input: &mut Input, logger: &Logger) -> Result<(CnfFormula, ClauseDatabase)> {
    let mut formula = CnfFormula::default();
    // Find and parse the header.
    loop {
        match input.next_token()? {
            Token::Eol => continue,
            Token::Word(word) => {
                if word.starts_with('c') {
                    process_comment(input, &mut formula, logger)?;
                } else if word == "p" {
                    parse_header(input, &mut formula)?;
                    break;
                } else {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "parse_cnf",
                        format!("Unexpected token string ('{}') while looking for CNF header", word),
                    ));
                }
            }
            other => {
                return Err(input.failure(
                    FailureKind::Parse,
                    "parse_cnf",
                    format!("Unexpected token {} while looking for CNF header", other),
                ))
            }
        }
    }
    // Read the clauses.
    let mut db = ClauseDatabase::new(formula.clauses);
    let mut found = 0_u32;
    let mut within_clause = false;
    loop {
        match input.next_token()? {
            Token::Eof => break,
            Token::Eol => continue,
            Token::Word(word) if word.starts_with('c') => {
                process_comment(input, &mut formula, logger)?;
            }
            Token::Int(value) => {
                if !within_clause {
                    db.start(Clause::new(found + 1)).map_err(|err| {
                        input.failure(FailureKind::DuplicateClauseId, "parse_cnf", err.to_string())
                    })?;
                    within_clause = true;
                }
                if value == 0 {
                    db.finish(ClauseType::Input).map_err(|err| {
                        input.failure(FailureKind::Parse, "parse_cnf", err.to_string())
                    })?;
                    found += 1;
                    within_clause = false;
                } else {
                    let literal = Literal::new(value);
                    if literal.var().0 > formula.variables {
                        return Err(input.failure(
                            FailureKind::VariableOutOfRange,
                            "parse_cnf",
                            format!(
                                "Literal {} exceeds the declared {} variables",
                                value, formula.variables
                            ),
                        ));
                    }
                    db.push_literal(literal);
                }
            }
            other => {
                return Err(input.failure(
                    FailureKind::Parse,
                    "parse_cnf",
                    format!("Unexpected token {} found in CNF file", other),
                ))
            }
        }
    }
    if found != formula.clauses {
        return Err(input.failure(
            FailureKind::Parse,
            "parse_cnf",
            format!(
                "Invalid CNF. Expected {} clauses. Found {}",
                formula.clauses, found
            ),
        ));
    }
    // When no show variables were given, every input variable is one.
    if formula.projected && !formula.show_declared {
        for var in 1..=formula.variables {
            formula.show[var as usize] = true;
        }
        logger.data(
            2,
            "No show variables declared. Declaring all input variables to be show variables",
        );
    }
    logger.data(
        1,
        format!(
            "Read CNF file with {} variables and {} clauses",
            formula.variables, formula.clauses
        ),
    );
    Ok((formula, db))
}

/// Parse `p cnf V C` (the leading `p` has been consumed).
fn parse_header(input: &mut Input, formula: &mut CnfFormula) -> Result<()> {
    match input.next_token()? {
        Token::Word(word) if word == "cnf" => (),
        other => {
            return Err(input.failure(
                FailureKind::Parse,
                "parse_header",
                format!("Expected field 'cnf'. Got {}", other),
            ))
        }
    }
    let variables = input.require_int("parse_header")?;
    let clauses = input.require_int("parse_header")?;
    if variables < 0 || clauses < 0 {
        return Err(input.failure(
            FailureKind::Parse,
            "parse_header",
            format!("Invalid CNF header counts {} {}", variables, clauses),
        ));
    }
    input.require_eol("parse_header")?;
    formula.variables = variables as u32;
    formula.clauses = clauses as u32;
    let size = Variable::new(formula.variables).array_size();
    if formula.show.len() > size {
        return Err(input.failure(
            FailureKind::Parse,
            "parse_header",
            format!(
                "Invalid CNF variable count {}. Have already declared {} as show variable",
                formula.variables,
                formula.show.len() - 1
            ),
        ));
    }
    formula.show.resize(size);
    formula.positive_weight.resize(size);
    formula.negative_weight.resize(size);
    Ok(())
}

/// Process the rest of a comment line, which may carry a directive.
fn process_comment(input: &mut Input, formula: &mut CnfFormula, logger: &Logger) -> Result<()> {
    match input.next_token()? {
        Token::Eol | Token::Eof => return Ok(()),
        Token::Word(word) if word == "t" => match input.next_token()? {
            Token::Word(kind) => {
                if kind == "pmc" || kind == "pwmc" {
                    formula.projected = true;
                    logger.data(3, "Performing projected knowledge compilation");
                }
                if kind == "wmc" || kind == "pwmc" {
                    formula.weighted = true;
                }
            }
            Token::Eol | Token::Eof => return Ok(()),
            _ => (),
        },
        Token::Word(word) if word == "p" => match input.next_token()? {
            Token::Word(directive) if directive == "show" && formula.projected => {
                parse_show_list(input, formula)?;
                logger.data(3, "Found show variables");
            }
            Token::Word(directive) if directive == "weight" => {
                parse_weight(input, formula)?;
            }
            Token::Eol | Token::Eof => return Ok(()),
            _ => (),
        },
        _ => (),
    }
    input.skip_to_eol();
    Ok(())
}

/// Parse the variable list of a `c p show` directive.
fn parse_show_list(input: &mut Input, formula: &mut CnfFormula) -> Result<()> {
    formula.show_declared = true;
    loop {
        let value = match input.next_token()? {
            Token::Int(value) => value,
            Token::Eol | Token::Eof => {
                return Err(input.failure(
                    FailureKind::Parse,
                    "parse_show_list",
                    "List of show variables not terminated by '0'".to_string(),
                ))
            }
            other => {
                return Err(input.failure(
                    FailureKind::Parse,
                    "parse_show_list",
                    format!("Couldn't parse list of show variables: got {}", other),
                ))
            }
        };
        if value == 0 {
            return Ok(());
        }
        if value < 0 {
            return Err(input.failure(
                FailureKind::Parse,
                "parse_show_list",
                format!("Invalid variable ID {}", value),
            ));
        }
        let var = value as usize;
        if formula.variables > 0 && var > formula.variables as usize {
            return Err(input.failure(
                FailureKind::Parse,
                "parse_show_list",
                format!(
                    "Invalid variable ID {}. Have declared total of {} input variables",
                    var, formula.variables
                ),
            ));
        }
        // Before the header the list grows on demand.
        if var >= formula.show.len() {
            formula.show.resize(var + 1);
        }
        formula.show[var] = true;
    }
}

/// Parse one `c p weight ℓ q 0` entry.
fn parse_weight(input: &mut Input, formula: &mut CnfFormula) -> Result<()> {
    let value = input.require_int("parse_weight")?;
    if value == 0 {
        return Err(input.failure(
            FailureKind::Weight,
            "parse_weight",
            "Invalid literal 0 for weight".to_string(),
        ));
    }
    let literal = Literal::new(value);
    if literal.var().0 == 0 || literal.var().0 > formula.variables {
        return Err(input.failure(
            FailureKind::Weight,
            "parse_weight",
            format!("Invalid literal {} for weight", value),
        ));
    }
    let word = input.next_raw_word("parse_weight")?;
    let weight = Number::parse(&word);
    if !weight.is_valid() {
        return Err(input.failure(
            FailureKind::Weight,
            "parse_weight",
            format!("Couldn't read weight for literal {}", value),
        ));
    }
    match input.next_token()? {
        Token::Int(0) => (),
        other => {
            return Err(input.failure(
                FailureKind::Weight,
                "parse_weight",
                format!("Weight for literal {} not terminated by '0': got {}", value, other),
            ))
        }
    }
    let slot = if literal.is_negative() {
        &mut formula.negative_weight[literal.var().as_offset()]
    } else {
        &mut formula.positive_weight[literal.var().as_offset()]
    };
    if slot.is_some() {
        return Err(input.failure(
            FailureKind::Weight,
            "parse_weight",
            format!("Already have weight for literal {}", value),
        ));
    }
    *slot = Some(weight);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &'static str) -> Result<(CnfFormula, ClauseDatabase)> {
        let mut input = Input::new(Box::new(text.as_bytes().iter().cloned()), "<test>");
        parse_cnf(&mut input, &Logger::new(0, None))
    }

    fn literals_of(db: &ClauseDatabase, id: u32) -> Vec<i32> {
        let location = db.find(Clause::new(id)).expect("clause not found");
        db.literals(location)
            .expect("hole")
            .iter()
            .map(|literal| literal.decode())
            .collect()
    }

    #[test]
    fn plain_formula() {
        let (formula, db) = parse(
            "c comment\n\
             p cnf 2 2\n\
             1 2 0\n\
             c comment\n\
             -1 -2 0\n",
        )
        .expect("parse failed");
        assert_eq!(formula.variables, 2);
        assert_eq!(formula.clauses, 2);
        assert!(!formula.projected);
        assert!(!formula.weighted);
        assert_eq!(literals_of(&db, 1), vec![1, 2]);
        assert_eq!(literals_of(&db, 2), vec![-1, -2]);
        assert_eq!(db.clause_type(db.find(Clause::new(1)).unwrap()), ClauseType::Input);
        assert_eq!(formula.data_variable_count(), 2);
    }

    #[test]
    fn clauses_may_span_lines() {
        let (_formula, db) = parse("p cnf 3 1\n1 2\n3 0\n").expect("parse failed");
        assert_eq!(literals_of(&db, 1), vec![1, 2, 3]);
    }

    #[test]
    fn projected_directives() {
        let (formula, _db) = parse(
            "c t pmc\n\
             c p show 1 2 0\n\
             p cnf 3 2\n\
             1 3 0\n\
             2 -3 0\n",
        )
        .expect("parse failed");
        assert!(formula.projected);
        assert!(formula.show_declared);
        assert!(formula.is_show(Variable::new(1)));
        assert!(formula.is_show(Variable::new(2)));
        assert!(!formula.is_show(Variable::new(3)));
        assert_eq!(formula.data_variable_count(), 2);
    }

    #[test]
    fn projection_defaults_to_all_variables() {
        let (formula, _db) = parse("c t pmc\np cnf 2 1\n1 2 0\n").expect("parse failed");
        assert!(formula.projected && !formula.show_declared);
        assert!(formula.is_show(Variable::new(1)));
        assert!(formula.is_show(Variable::new(2)));
    }

    #[test]
    fn weights() {
        let (formula, _db) = parse(
            "p cnf 1 1\n\
             c t wmc\n\
             c p weight 1 0.25 0\n\
             c p weight -1 0.75 0\n\
             1 0\n",
        )
        .expect("parse failed");
        assert!(formula.weighted && !formula.projected);
        assert_eq!(formula.positive_weight[1], Some(Number::parse("0.25")));
        assert_eq!(formula.negative_weight[1], Some(Number::parse("0.75")));
    }

    #[test]
    fn clause_count_must_match() {
        assert!(parse("p cnf 1 2\n1 0\n").is_err());
    }

    #[test]
    fn out_of_range_literals_are_rejected() {
        let result = parse("p cnf 1 1\n1 2 0\n");
        assert_eq!(
            result.err().map(|failure| failure.kind),
            Some(FailureKind::VariableOutOfRange)
        );
    }

    #[test]
    fn duplicate_weight_is_rejected() {
        let result = parse(
            "p cnf 1 1\nc t wmc\nc p weight 1 0.25 0\nc p weight 1 0.5 0\n1 0\n",
        );
        assert_eq!(
            result.err().map(|failure| failure.kind),
            Some(FailureKind::Weight)
        );
    }
}
