//! Proof checker for CPOG/SCPOG knowledge-compilation certificates, with
//! exact weighted and unweighted model counting

use clap::{Arg, ArgMatches};
use std::{
    sync::Mutex,
    thread,
    time::Instant,
};
use veripog_common::{
    as_error,
    clause::{Clause, ClauseType},
    clausedatabase::{ClauseDatabase, StoreError},
    config,
    error::{CheckFailure, FailureKind, Result},
    input::{Input, Token},
    literal::{Literal, Variable},
    litset::LiteralSet,
    memory::{format_memory_usage, Array, BoundedVector, HeapSpace, Offset, Vector},
    number::{self, Number},
    output::{install_signal_handler, print_key_value, unreachable, Logger, Timer},
    parser::{open_input, parse_cnf, CnfFormula},
    puts, requires,
};
use veripog_macros::HeapSpace;

/// Run `veripog`.
fn main() {
    std::process::exit(run_frontend());
}

/// Run `veripog`, returning its exit code.
///
/// This is a separate function because `std::process::exit` does not
/// call destructors.
fn run_frontend() -> i32 {
    install_signal_handler();
    let app = clap::App::new("veripog")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("CNF")
                .required(true)
                .help("input formula in DIMACS format"),
        )
        .arg(Arg::with_name("CPOG").help("proof file in CPOG or SCPOG format"))
        .arg(
            Arg::with_name("VERBOSITY")
                .short("v")
                .takes_value(true)
                .help("Verbosity level 0..4"),
        )
        .arg(
            Arg::with_name("LOGFILE")
                .short("L")
                .long("logfile")
                .takes_value(true)
                .help("Record a copy of all diagnostics in this file"),
        )
        .arg(
            Arg::with_name("SKIP_ADDITIONS")
                .short("A")
                .long("skip-additions")
                .help("Don't check clause additions (hint lists are discarded)"),
        )
        .arg(
            Arg::with_name("SKIP_DELETIONS")
                .short("D")
                .long("skip-deletions")
                .help("Don't check clause deletions"),
        )
        .arg(
            Arg::with_name("THREADS")
                .short("n")
                .long("threads")
                .takes_value(true)
                .help("Worker threads for the input-deletion phase"),
        )
        .arg(
            Arg::with_name("LENIENT")
                .short("l")
                .long("lenient")
                .help(
                    "Allow non-propagating RUP hints (with a warning) and \
                     repeated literals in node argument lists",
                ),
        )
        .arg(
            Arg::with_name("NO_EARLY_RUP")
                .long("no-early-rup")
                .help("Reject RUP conflicts that occur before the hint terminator"),
        )
        .arg(
            Arg::with_name("EXPLICIT_SKOLEM")
                .short("e")
                .long("explicit-skolem")
                .help("Materialize Skolem implication clauses instead of counting them as virtual"),
        )
        .arg(
            Arg::with_name("WEAK")
                .short("w")
                .long("weak")
                .help("Check weak projected compilation: allow non-mutex sums and skip counting"),
        );
    let flags = Flags::new(app.get_matches());
    let logger = Logger::new(flags.verbosity, flags.logfile.clone());
    let timer = Timer::name("total time");
    let result = run(&flags, &logger);
    drop(timer);
    match result {
        Ok(()) => 0,
        Err(failure) => {
            logger.failure(&failure);
            1
        }
    }
}

/// Parsed arguments. See `veripog --help`.
#[derive(Debug)]
pub struct Flags {
    pub verbosity: i32,
    pub logfile: Option<String>,
    pub check_add: bool,
    pub check_delete: bool,
    /// Tolerate non-propagating hints and repeated node-argument literals.
    pub lenient: bool,
    /// Accept a RUP conflict before the hint terminator.
    pub early_rup: bool,
    /// Store Skolem implication clauses instead of counting them as virtual.
    pub explicit_skolem: bool,
    /// Weak equivalence checking: non-mutex sums allowed, no counting.
    pub weak: bool,
    pub threads: usize,
    pub cnf_filename: String,
    pub cpog_filename: Option<String>,
}

impl Flags {
    /// Create a flags instance from commandline arguments.
    pub fn new(matches: ArgMatches) -> Flags {
        Flags {
            verbosity: number_flag(&matches, "VERBOSITY", 1),
            logfile: matches.value_of("LOGFILE").map(String::from),
            check_add: !matches.is_present("SKIP_ADDITIONS"),
            check_delete: !matches.is_present("SKIP_DELETIONS"),
            lenient: matches.is_present("LENIENT"),
            early_rup: !matches.is_present("NO_EARLY_RUP"),
            explicit_skolem: matches.is_present("EXPLICIT_SKOLEM"),
            weak: matches.is_present("WEAK"),
            threads: number_flag(&matches, "THREADS", 1).max(1) as usize,
            cnf_filename: matches.value_of("CNF").unwrap().to_string(),
            cpog_filename: matches.value_of("CPOG").map(String::from),
        }
    }
}

/// Parse a numeric commandline option.
fn number_flag(matches: &ArgMatches, name: &str, default: i32) -> i32 {
    match matches.value_of(name) {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            as_error!(puts!("invalid value '{}' for option {}\n", text, name));
            std::process::exit(1);
        }),
    }
}

/// The type of a POG node.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum NodeType {
    Product,
    Skolem,
    Sum,
    /// Allocated but never declared.
    None,
}

impl Default for NodeType {
    fn default() -> NodeType {
        NodeType::None
    }
}

impl NodeType {
    fn letter(self) -> char {
        match self {
            NodeType::Product => 'P',
            NodeType::Skolem => 'T',
            NodeType::Sum => 'S',
            NodeType::None => 'N',
        }
    }
}

/// One POG node. Children are literals (input variables or earlier nodes);
/// the dependency set is the sorted list of input variables below the node.
#[derive(Debug, Clone, Default, HeapSpace)]
struct Node {
    node_type: NodeType,
    /// First defining clause id.
    first_cid: Clause,
    children: Vector<Literal>,
    dependencies: Vector<Variable>,
}

/// Indexed store of POG nodes, covering the extension variable range.
#[derive(Debug, HeapSpace)]
struct NodeTable {
    /// The id of the first extension variable (input variables + 1).
    first_id: u32,
    nodes: Vector<Node>,
}

impl NodeTable {
    fn new(first_id: u32) -> NodeTable {
        NodeTable {
            first_id,
            nodes: Vector::new(),
        }
    }
    /// The highest node id allocated so far.
    fn limit(&self) -> u32 {
        self.first_id + self.nodes.len() as u32 - 1
    }
    /// Look up a declared node.
    fn get(&self, var: Variable) -> Option<&Node> {
        if var.0 < self.first_id {
            return None;
        }
        let index = (var.0 - self.first_id) as usize;
        if index >= self.nodes.len() || self.nodes[index].node_type == NodeType::None {
            return None;
        }
        Some(&self.nodes[index])
    }
    /// Insert a declared node; fails if the id is already in use.
    fn insert(&mut self, var: Variable, node: Node) -> bool {
        requires!(var.0 >= self.first_id);
        let index = (var.0 - self.first_id) as usize;
        while self.nodes.len() <= index {
            self.nodes.push(Node::default());
        }
        if self.nodes[index].node_type != NodeType::None {
            return false;
        }
        self.nodes[index] = node;
        true
    }
    /// Iterate over declared nodes in id order.
    fn iter(&self) -> impl Iterator<Item = (Variable, &Node)> {
        let first_id = self.first_id;
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.node_type != NodeType::None)
            .map(move |(index, node)| (Variable::new(first_id + index as u32), node))
    }
}

/// Running totals reported at the end of proof processing.
#[derive(Debug, Default)]
struct Counters {
    operations: usize,
    forward_clauses: usize,
    structural_clauses: usize,
    tseitin_clauses: usize,
    disable_clauses: usize,
    skolem_clauses: usize,
    virtual_clauses: u64,
    explicit_deletions: usize,
    noninput_deletions: usize,
    implicit_deletions: usize,
    events: u64,
}

/// The checker context: every piece of mutable state lives here.
struct Checker<'a> {
    flags: &'a Flags,
    logger: &'a Logger,
    formula: CnfFormula,
    clause_db: ClauseDatabase,
    nodes: NodeTable,
    litset: LiteralSet,
    /// Highest variable that may occur in a clause (inputs + declared nodes).
    variable_limit: u32,
    /// The declared root literal; 0 means declared unsatisfiable.
    declared_root: i32,
    declared_unsatisfiable: bool,
    proved_unsatisfiable: bool,
    root_clause_added: bool,
    counters: Counters,
}

/// Result of consuming a RUP hint list.
struct RupOutcome {
    /// Whether the end-of-line token was consumed along with the hints.
    line_ended: bool,
}

/// Result of unit propagation over a single hint clause.
enum Propagation {
    Conflict,
    Unit(Literal),
    Stall,
}

/// Load the negation of a clause into the literal set.
///
/// Returns false if this hits a contradiction, which means the clause is a
/// tautology.
fn rup_setup(litset: &mut LiteralSet, literals: &[Literal]) -> bool {
    litset.clear();
    for &literal in literals {
        if !litset.assign(-literal) {
            return false;
        }
    }
    true
}

/// Unit-propagate one hint clause against the literal set.
fn propagate_hint(litset: &LiteralSet, literals: &[Literal]) -> Propagation {
    let mut unit: Option<Literal> = None;
    for &literal in literals {
        if unit == Some(literal) {
            // Repetition of the literal this clause already implied.
            continue;
        }
        match litset.literal(literal.var()) {
            Some(present) if present == literal => return Propagation::Stall,
            Some(_) => continue,
            None => {
                if unit.is_some() {
                    return Propagation::Stall;
                }
                unit = Some(literal);
            }
        }
    }
    match unit {
        None => Propagation::Conflict,
        Some(literal) => Propagation::Unit(literal),
    }
}

/// The hint/target compatibility table: which clause types may justify
/// which RUP targets.
fn hint_type_allowed(hint: ClauseType, target: ClauseType) -> bool {
    match hint {
        ClauseType::Tseitin => true,
        ClauseType::Forward => target == ClauseType::Forward || target == ClauseType::Root,
        ClauseType::Input => {
            target == ClauseType::Forward
                || target == ClauseType::Root
                || target == ClauseType::Input
        }
        ClauseType::Skolem | ClauseType::Root => target == ClauseType::Input,
        ClauseType::Structural | ClauseType::Disable => {
            target == ClauseType::Forward
                || target == ClauseType::Root
                || target == ClauseType::Structural
        }
        _ => false,
    }
}

impl<'a> Checker<'a> {
    fn new(
        formula: CnfFormula,
        clause_db: ClauseDatabase,
        flags: &'a Flags,
        logger: &'a Logger,
    ) -> Checker<'a> {
        let variables = formula.variables;
        Checker {
            flags,
            logger,
            litset: LiteralSet::with_maxvar(Variable::new(variables)),
            nodes: NodeTable::new(variables + 1),
            variable_limit: variables,
            declared_root: 0,
            declared_unsatisfiable: false,
            proved_unsatisfiable: false,
            root_clause_added: false,
            counters: Counters::default(),
            formula,
            clause_db,
        }
    }

    /// Convert a store error into a positioned failure.
    fn store_failure(
        &self,
        input: &Input,
        function: &'static str,
        error: StoreError,
    ) -> CheckFailure {
        let kind = match error {
            StoreError::DuplicateClauseId { .. } => FailureKind::DuplicateClauseId,
            _ => FailureKind::Parse,
        };
        input.failure(kind, function, error.to_string())
    }

    /// Check that a command carries a positive clause id.
    fn positive_cid(&self, input: &Input, cid: i32, function: &'static str) -> Result<Clause> {
        if cid <= 0 {
            return Err(input.failure(
                FailureKind::Parse,
                function,
                format!("Command requires a positive clause id, got {}", cid),
            ));
        }
        Ok(Clause::new(cid as u32))
    }

    /// Reject literals whose variable exceeds the current limit.
    fn check_variable(&self, input: &Input, value: i32, function: &'static str) -> Result<Literal> {
        let literal = Literal::new(value);
        if literal.var().0 == 0 || literal.var().0 > self.variable_limit {
            return Err(input.failure(
                FailureKind::VariableOutOfRange,
                function,
                format!(
                    "Literal {} exceeds variable limit of {}",
                    value, self.variable_limit
                ),
            ));
        }
        Ok(literal)
    }

    /// Run a hint-directed RUP check; the hints are consumed from the input.
    ///
    /// The literal set must hold the negated target (or the mutex
    /// assumption) already.
    fn check_rup(
        &mut self,
        input: &mut Input,
        target: Clause,
        target_type: ClauseType,
    ) -> Result<RupOutcome> {
        let mut conflict = false;
        let mut types_ok = true;
        let mut steps = 0_usize;
        loop {
            let token = input.next_token()?;
            match token {
                Token::Star => {
                    return Err(input.failure(
                        FailureKind::RupFailure,
                        "check_rup",
                        "This checker requires explicit hints".to_string(),
                    ))
                }
                Token::Int(0) => {
                    return self.finish_rup(input, target, target_type, conflict, types_ok, steps, false)
                }
                Token::Eol | Token::Eof => {
                    // A conflict makes the remaining hints irrelevant, so a
                    // line may end right after the conflicting hint.
                    if conflict {
                        return self
                            .finish_rup(input, target, target_type, conflict, types_ok, steps, true);
                    }
                    return Err(input.failure(
                        FailureKind::RupFailure,
                        "check_rup",
                        format!(
                            "RUP failure for clause {}. Hint list ended without conflict",
                            target
                        ),
                    ));
                }
                Token::Int(hint) => {
                    if conflict {
                        if !self.flags.early_rup {
                            return Err(input.failure(
                                FailureKind::RupFailure,
                                "check_rup",
                                format!(
                                    "RUP failure for clause {}. Encountered conflict after \
                                     processing {} hints. Not at end of hint list",
                                    target, steps
                                ),
                            ));
                        }
                        // Discard the rest of the hint list.
                        continue;
                    }
                    self.apply_hint(input, target, target_type, hint, &mut conflict, &mut types_ok)?;
                    steps += 1;
                }
                other => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "check_rup",
                        format!(
                            "RUP for clause {}. Expecting integer hint. Got {} instead",
                            target, other
                        ),
                    ))
                }
            }
        }
    }

    /// Process one hint clause inside [`check_rup()`](#method.check_rup).
    fn apply_hint(
        &mut self,
        input: &Input,
        target: Clause,
        target_type: ClauseType,
        hint: i32,
        conflict: &mut bool,
        types_ok: &mut bool,
    ) -> Result<()> {
        let location = if hint > 0 {
            self.clause_db.find(Clause::new(hint as u32))
        } else {
            None
        };
        let location = location.ok_or_else(|| {
            input.failure(
                FailureKind::RupFailure,
                "apply_hint",
                format!(
                    "RUP failure for clause {}. Encountered invalid hint clause {}",
                    target, hint
                ),
            )
        })?;
        let hint_type = self.clause_db.clause_type(location);
        *types_ok = *types_ok && hint_type_allowed(hint_type, target_type);
        let outcome = match self.clause_db.literals(location) {
            None => {
                return Err(input.failure(
                    FailureKind::UnknownClauseId,
                    "apply_hint",
                    format!(
                        "RUP failure for clause {}. Hint clause {} has no literals",
                        target, hint
                    ),
                ))
            }
            Some(literals) => propagate_hint(&self.litset, literals),
        };
        match outcome {
            Propagation::Conflict => *conflict = true,
            Propagation::Unit(literal) => {
                self.litset.assign(literal);
            }
            Propagation::Stall => {
                if self.flags.lenient {
                    self.logger.warning(format!(
                        "No unit propagation by hint clause {} in RUP for clause {}",
                        hint, target
                    ));
                } else {
                    if self.logger.verbosity >= 2 {
                        self.logger.info(2, format!("    Added literals: {}", self.litset));
                        self.logger
                            .info(2, format!("    Hint {}", self.clause_db.clause_to_string(Clause::new(hint as u32))));
                    }
                    return Err(input.failure(
                        FailureKind::RupFailure,
                        "apply_hint",
                        format!(
                            "RUP failure for clause {}. Hint clause {} did not cause unit \
                             propagation",
                            target, hint
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Final bookkeeping of a RUP check once the hint list is exhausted.
    #[allow(clippy::too_many_arguments)]
    fn finish_rup(
        &self,
        input: &Input,
        target: Clause,
        target_type: ClauseType,
        conflict: bool,
        types_ok: bool,
        steps: usize,
        line_ended: bool,
    ) -> Result<RupOutcome> {
        if !conflict {
            if self.logger.verbosity >= 2 {
                self.logger.info(2, format!("    Added literals: {}", self.litset));
            }
            return Err(input.failure(
                FailureKind::RupFailure,
                "finish_rup",
                format!(
                    "RUP failure for clause {}. Didn't have conflict on final clause",
                    target
                ),
            ));
        }
        if !types_ok {
            return Err(input.failure(
                FailureKind::RupFailure,
                "finish_rup",
                format!(
                    "RUP failure for clause {}. Combination of target type and hint types \
                     not allowed",
                    target
                ),
            ));
        }
        if target_type == ClauseType::Structural {
            self.logger
                .info(3, format!("RUP for mutex. Succeeded in {} steps", steps));
        } else {
            self.logger.info(
                3,
                format!("RUP for clause {}. Succeeded in {} steps", target, steps),
            );
        }
        Ok(RupOutcome { line_ended })
    }

    /// Discard a hint list without checking it.
    fn skip_rup(&self, input: &mut Input) -> Result<RupOutcome> {
        loop {
            match input.next_token()? {
                Token::Int(0) => return Ok(RupOutcome { line_ended: false }),
                Token::Eol | Token::Eof => return Ok(RupOutcome { line_ended: true }),
                _ => continue,
            }
        }
    }

    /// Process one CPOG/SCPOG file.
    fn process_cpog(&mut self, input: &mut Input) -> Result<()> {
        loop {
            let mut cid = 0;
            let command = match input.next_token()? {
                Token::Eof => break,
                Token::Eol => continue,
                Token::Word(word) => {
                    if word.starts_with('c') {
                        input.skip_to_eol();
                        continue;
                    }
                    word
                }
                Token::Int(value) => {
                    cid = value;
                    match input.next_token()? {
                        Token::Word(word) => word,
                        other => {
                            return Err(input.failure(
                                FailureKind::Parse,
                                "process_cpog",
                                format!("Expecting CPOG command. Got {} instead", other),
                            ))
                        }
                    }
                }
                other => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "process_cpog",
                        format!("Expecting CPOG command. Got {} instead", other),
                    ))
                }
            };
            match command.as_str() {
                "a" => self.add_clause(input, cid, false)?,
                "as" => self.add_clause(input, cid, true)?,
                "r" => self.read_root(input)?,
                "d" => self.delete_input_clause(input)?,
                "D" => self.batch_delete(input)?,
                "p" => self.add_product(input, cid)?,
                "t" => self.add_skolem(input, cid)?,
                "s" => self.add_sum(input, cid, false)?,
                "S" => {
                    if !self.flags.weak {
                        return Err(input.failure(
                            FailureKind::Parse,
                            "process_cpog",
                            "Encountered weak sum node, but not in weak mode".to_string(),
                        ));
                    }
                    self.add_sum(input, cid, true)?
                }
                _ => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "process_cpog",
                        format!("Invalid CPOG command '{}'", command),
                    ))
                }
            }
        }
        self.report_cpog_statistics();
        Ok(())
    }

    /// Summary statistics after the proof file has been consumed.
    fn report_cpog_statistics(&self) {
        let counters = &self.counters;
        let root_count = if self.root_clause_added { 1 } else { 0 };
        let all_clauses = counters.tseitin_clauses
            + counters.disable_clauses
            + counters.skolem_clauses
            + counters.structural_clauses
            + counters.forward_clauses
            + root_count;
        if self.flags.explicit_skolem {
            self.logger.data(
                1,
                format!(
                    "Read CPOG file with {} operations, {} Tseitin + {} Disable + {} Skolem \
                     + {} Structural + {} Forward + {} root = {} clauses",
                    counters.operations,
                    counters.tseitin_clauses,
                    counters.disable_clauses,
                    counters.skolem_clauses,
                    counters.structural_clauses,
                    counters.forward_clauses,
                    root_count,
                    all_clauses
                ),
            );
        } else {
            self.logger.data(
                1,
                format!(
                    "Read CPOG file with {} operations, {} Tseitin + {} Disable + {} Structural \
                     + {} Forward + {} root = {} real + {} virtual clauses",
                    counters.operations,
                    counters.tseitin_clauses,
                    counters.disable_clauses,
                    counters.structural_clauses,
                    counters.forward_clauses,
                    root_count,
                    all_clauses,
                    counters.virtual_clauses
                ),
            );
        }
        self.logger.data(
            3,
            format!(
                "Clauses divided into {} blocks",
                self.clause_db.number_of_blocks()
            ),
        );
        self.logger.data(
            1,
            format!(
                "Explicitly deleted {} input and {} non-input clauses",
                counters.explicit_deletions, counters.noninput_deletions
            ),
        );
    }

    /// The `r` command: declare the root literal (0 declares the formula
    /// unsatisfiable).
    fn read_root(&mut self, input: &mut Input) -> Result<()> {
        let value = input.require_int("read_root")?;
        self.declared_root = value;
        if value == 0 {
            self.declared_unsatisfiable = true;
            self.logger
                .info(3, "Formula declared to be unsatisfiable");
        } else {
            self.logger
                .info(3, format!("Root literal declared as {}", value));
        }
        Ok(())
    }

    /// The `a` and `as` commands: add a RUP-validated clause.
    fn add_clause(&mut self, input: &mut Input, cid: i32, is_structural: bool) -> Result<()> {
        let cid = self.positive_cid(input, cid, "add_clause")?;
        self.litset.clear();
        self.clause_db
            .start(cid)
            .map_err(|err| self.store_failure(input, "add_clause", err))?;
        let mut length = 0_usize;
        let mut last_literal = 0_i32;
        loop {
            let value = input.require_int("add_clause")?;
            if value == 0 {
                break;
            }
            let literal = self.check_variable(input, value, "add_clause")?;
            self.clause_db.push_literal(literal);
            if !self.litset.assign(-literal) {
                return Err(input.failure(
                    FailureKind::RupFailure,
                    "add_clause",
                    format!("Clause {} is self-contradictory", cid),
                ));
            }
            last_literal = value;
            length += 1;
        }
        let clause_type = if is_structural {
            ClauseType::Structural
        } else if length == 0 {
            self.proved_unsatisfiable = true;
            ClauseType::Forward
        } else if length == 1 && last_literal == self.declared_root {
            self.root_clause_added = true;
            ClauseType::Root
        } else {
            ClauseType::Forward
        };
        let outcome = if self.flags.check_add {
            self.check_rup(input, cid, clause_type)?
        } else {
            self.skip_rup(input)?
        };
        if !outcome.line_ended {
            input.require_eol("add_clause")?;
        }
        self.clause_db
            .finish(clause_type)
            .map_err(|err| self.store_failure(input, "add_clause", err))?;
        match clause_type {
            ClauseType::Forward => self.counters.forward_clauses += 1,
            ClauseType::Structural => self.counters.structural_clauses += 1,
            _ => (),
        }
        self.logger.info(
            3,
            format!(
                "Processed clause {} addition. Type = {}",
                cid,
                clause_type.name()
            ),
        );
        Ok(())
    }

    /// The `d` command: delete one input clause, justified by RUP over the
    /// remaining clauses.
    fn delete_input_clause(&mut self, input: &mut Input) -> Result<()> {
        let value = input.require_int("delete_input_clause")?;
        if value <= 0 || value as u32 > self.formula.clauses {
            return Err(input.failure(
                FailureKind::Parse,
                "delete_input_clause",
                format!(
                    "Cannot delete clause #{}. Can only delete input clauses",
                    value
                ),
            ));
        }
        let cid = Clause::new(value as u32);
        let location = self.clause_db.find(cid).ok_or_else(|| {
            input.failure(
                FailureKind::UnknownClauseId,
                "delete_input_clause",
                format!("Could not delete clause {}. Never defined", cid),
            )
        })?;
        let tautology = match self.clause_db.literals(location) {
            None => {
                return Err(input.failure(
                    FailureKind::AlreadyDeleted,
                    "delete_input_clause",
                    format!("Could not delete clause {}. Never defined or already deleted", cid),
                ))
            }
            Some(literals) => !rup_setup(&mut self.litset, literals),
        };
        // Delete before running RUP, so the clause cannot justify itself.
        if !self.clause_db.delete(location) {
            return Err(input.failure(
                FailureKind::AlreadyDeleted,
                "delete_input_clause",
                format!("Could not delete clause {}. Never defined or already deleted", cid),
            ));
        }
        if !tautology {
            let outcome = if self.flags.check_delete {
                self.check_rup(input, cid, ClauseType::Input)?
            } else {
                self.skip_rup(input)?
            };
            if !outcome.line_ended {
                input.skip_to_eol();
            }
        } else {
            input.skip_to_eol();
        }
        self.counters.explicit_deletions += 1;
        self.logger
            .info(3, format!("Processed input clause {} deletion", cid));
        Ok(())
    }

    /// The `D` command: batch-delete non-input forward/structural clauses.
    fn batch_delete(&mut self, input: &mut Input) -> Result<()> {
        let mut deleted = 0_usize;
        loop {
            let value = match input.next_token()? {
                Token::Int(value) => value,
                Token::Eol | Token::Eof => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "batch_delete",
                        "Unexpected end-of-line. List of clauses must be terminated by 0"
                            .to_string(),
                    ))
                }
                other => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "batch_delete",
                        format!("Unexpected token {}", other),
                    ))
                }
            };
            if value == 0 {
                break;
            }
            let cid = Clause::new(value.max(0) as u32);
            let location = (value > 0).then(|| self.clause_db.find(cid)).flatten();
            let location = location.ok_or_else(|| {
                input.failure(
                    FailureKind::UnknownClauseId,
                    "batch_delete",
                    format!("Cannot delete clause #{}. Not defined", value),
                )
            })?;
            let clause_type = self.clause_db.clause_type(location);
            match clause_type {
                ClauseType::Forward | ClauseType::Structural => (),
                ClauseType::Unknown => {
                    return Err(input.failure(
                        FailureKind::AlreadyDeleted,
                        "batch_delete",
                        format!("Cannot delete clause #{}. Already deleted", cid),
                    ))
                }
                other => {
                    return Err(input.failure(
                        FailureKind::Parse,
                        "batch_delete",
                        format!(
                            "Cannot delete clause #{} (type {}) with 'D' command",
                            cid, other
                        ),
                    ))
                }
            }
            self.clause_db.delete(location);
            deleted += 1;
        }
        input.skip_to_eol();
        self.counters.noninput_deletions += deleted;
        self.logger
            .info(3, format!("Deleted {} non-input clauses", deleted));
        Ok(())
    }

    /// Parse a node id, which must lie in the extension range.
    fn parse_node_id(&self, input: &mut Input, function: &'static str) -> Result<Variable> {
        let value = input.require_int(function)?;
        if value <= self.formula.variables as i32 {
            return Err(input.failure(
                FailureKind::Parse,
                function,
                format!("Invalid operation id {}", value),
            ));
        }
        Ok(Variable::new(value as u32))
    }

    /// Install a fully built node and extend the variable limit.
    fn install_node(&mut self, input: &Input, id: Variable, node: Node) -> Result<()> {
        if !self.nodes.insert(id, node) {
            return Err(input.failure(
                FailureKind::IntegrityFailure,
                "install_node",
                format!("Cannot create new node with id {}. Id already in use", id),
            ));
        }
        self.variable_limit = self.variable_limit.max(self.nodes.limit());
        self.counters.operations += 1;
        Ok(())
    }

    /// Store one defining clause for a node.
    fn emit_defining_clause(
        &mut self,
        input: &Input,
        cid: Clause,
        literals: &[Literal],
        clause_type: ClauseType,
    ) -> Result<()> {
        self.clause_db
            .start(cid)
            .map_err(|err| self.store_failure(input, "emit_defining_clause", err))?;
        for &literal in literals {
            self.clause_db.push_literal(literal);
        }
        self.clause_db
            .finish(clause_type)
            .map_err(|err| self.store_failure(input, "emit_defining_clause", err))
    }

    /// The `p` command: declare a product node.
    fn add_product(&mut self, input: &mut Input, cid: i32) -> Result<()> {
        let cid = self.positive_cid(input, cid, "add_product")?;
        let nid = self.parse_node_id(input, "add_product")?;
        let mut children: Vector<Literal> = Vector::new();
        let mut dependencies: Vector<Variable> = Vector::new();
        let mut local_dependencies: Vector<Variable> = Vector::new();
        loop {
            let value = input.require_int("add_product")?;
            if value == 0 {
                break;
            }
            let literal = Literal::new(value);
            let var = literal.var();
            children.push(literal);
            if var.0 <= self.formula.variables {
                if self.formula.projected
                    && !self.formula.is_show(var)
                    && (nid.0 as i32) <= self.declared_root
                {
                    return Err(input.failure(
                        FailureKind::DependencyViolation,
                        "add_product",
                        format!(
                            "Can't add literal {} to node {} children. Not a data variable",
                            value, nid
                        ),
                    ));
                }
                local_dependencies.push(var);
            } else {
                if literal.is_negative() {
                    return Err(input.failure(
                        FailureKind::DependencyViolation,
                        "add_product",
                        format!(
                            "Can't add negative literal {} to node {} children. Violates NNF",
                            value, nid
                        ),
                    ));
                }
                let child = self.nodes.get(var).ok_or_else(|| {
                    input.failure(
                        FailureKind::DependencyViolation,
                        "add_product",
                        format!(
                            "Can't add literal {} to node {} children. Invalid node Id {}",
                            value, nid, var
                        ),
                    )
                })?;
                if let Some(shared) = common_variable(&dependencies, &child.dependencies) {
                    return Err(input.failure(
                        FailureKind::DependencyViolation,
                        "add_product",
                        format!(
                            "Can't add node {} to node {} children. Both dependency sets \
                             include variable {}",
                            value, nid, shared
                        ),
                    ));
                }
                dependencies = merge_variables(&dependencies, &child.dependencies);
            }
        }
        if !local_dependencies.is_empty() {
            local_dependencies.sort_unstable();
            if self.flags.lenient {
                local_dependencies = deduplicate(local_dependencies);
            } else if let Some(duplicate) = find_duplicate(&local_dependencies) {
                return Err(input.failure(
                    FailureKind::DependencyViolation,
                    "add_product",
                    format!(
                        "Can't add variable {} to node {} children. Same or opposite literals \
                         in argument",
                        duplicate, nid
                    ),
                ));
            }
            if let Some(shared) = common_variable(&dependencies, &local_dependencies) {
                return Err(input.failure(
                    FailureKind::DependencyViolation,
                    "add_product",
                    format!(
                        "Can't add variable {} to node {} children. Already in dependency set",
                        shared, nid
                    ),
                ));
            }
            dependencies = merge_variables(&dependencies, &local_dependencies);
        }
        input.require_eol("add_product")?;
        let node = Node {
            node_type: NodeType::Product,
            first_cid: cid,
            children: children.clone(),
            dependencies,
        };
        self.install_node(input, nid, node)?;
        // Defining clauses: (n ∨ ¬a ∨ …) and (¬n ∨ aᵢ) for each child.
        let mut first_clause: Vector<Literal> = Vector::new();
        first_clause.push(nid.literal());
        for &child in &children {
            first_clause.push(-child);
        }
        let is_root = children.is_empty() && nid.0 as i32 == self.declared_root;
        let first_type = if is_root {
            self.root_clause_added = true;
            ClauseType::Root
        } else {
            ClauseType::Tseitin
        };
        self.emit_defining_clause(input, cid, &first_clause, first_type)?;
        for (index, &child) in children.iter().enumerate() {
            let literals = [-nid.literal(), child];
            self.emit_defining_clause(
                input,
                Clause::new(cid.index + 1 + index as u32),
                &literals,
                ClauseType::Tseitin,
            )?;
        }
        self.counters.tseitin_clauses += children.len() + 1;
        self.logger
            .info(3, format!("Processed product {} addition", nid));
        Ok(())
    }

    /// The `t` command: declare a Skolem node (projected mode only).
    fn add_skolem(&mut self, input: &mut Input, cid: i32) -> Result<()> {
        let cid = self.positive_cid(input, cid, "add_skolem")?;
        let nid = self.parse_node_id(input, "add_skolem")?;
        if !self.formula.projected {
            return Err(input.failure(
                FailureKind::Parse,
                "add_skolem",
                format!(
                    "Cannot add Skolem node {}. Not performing projected compilation",
                    nid
                ),
            ));
        }
        let mut children: Vector<Literal> = Vector::new();
        let mut dependencies: Vector<Variable> = Vector::new();
        loop {
            let value = input.require_int("add_skolem")?;
            if value == 0 {
                break;
            }
            let literal = Literal::new(value);
            let var = literal.var();
            children.push(literal);
            if var.0 == 0 || var.0 > self.formula.variables {
                return Err(input.failure(
                    FailureKind::DependencyViolation,
                    "add_skolem",
                    format!(
                        "Can't add literal {} to node {} children. Child must be literal of \
                         projection variable",
                        value, nid
                    ),
                ));
            }
            if self.formula.is_show(var) {
                return Err(input.failure(
                    FailureKind::DependencyViolation,
                    "add_skolem",
                    format!(
                        "Can't add literal {} to skolem node {} children. Not a projection \
                         variable",
                        value, nid
                    ),
                ));
            }
            dependencies.push(var);
        }
        dependencies.sort_unstable();
        if self.flags.lenient {
            dependencies = deduplicate(dependencies);
        } else if let Some(duplicate) = find_duplicate(&dependencies) {
            return Err(input.failure(
                FailureKind::DependencyViolation,
                "add_skolem",
                format!(
                    "Can't add variable {} to Skolem node {} children. Same or opposite \
                     literals in argument",
                    duplicate, nid
                ),
            ));
        }
        input.require_eol("add_skolem")?;
        let node = Node {
            node_type: NodeType::Skolem,
            first_cid: cid,
            children: children.clone(),
            dependencies,
        };
        self.install_node(input, nid, node)?;
        // The node is asserted unconditionally; its implication clauses are
        // virtual unless explicit-deletion mode materializes them.
        self.emit_defining_clause(input, cid, &[nid.literal()], ClauseType::Disable)?;
        if self.flags.explicit_skolem {
            for (index, &child) in children.iter().enumerate() {
                let literals = [-nid.literal(), child];
                self.emit_defining_clause(
                    input,
                    Clause::new(cid.index + 1 + index as u32),
                    &literals,
                    ClauseType::Skolem,
                )?;
            }
            self.counters.skolem_clauses += children.len();
        } else {
            self.counters.virtual_clauses += children.len() as u64;
        }
        self.counters.disable_clauses += 1;
        self.logger
            .info(3, format!("Processed skolem {} addition", nid));
        Ok(())
    }

    /// The `s` and `S` commands: declare a sum node. Strong sums have
    /// exactly two children and require a mutual-exclusion proof.
    fn add_sum(&mut self, input: &mut Input, cid: i32, weak: bool) -> Result<()> {
        let cid = self.positive_cid(input, cid, "add_sum")?;
        let nid = self.parse_node_id(input, "add_sum")?;
        let mut children: Vector<Literal> = Vector::new();
        let mut dependencies: Vector<Variable> = Vector::new();
        let mut local_dependencies: Vector<Variable> = Vector::new();
        loop {
            let value = input.require_int("add_sum")?;
            if value == 0 {
                if weak {
                    break;
                }
                return Err(input.failure(
                    FailureKind::Parse,
                    "add_sum",
                    format!("Unexpected 0 among the children of sum node {}", nid),
                ));
            }
            let literal = Literal::new(value);
            let var = literal.var();
            children.push(literal);
            if var.0 <= self.formula.variables {
                if self.formula.projected && !self.formula.is_show(var) {
                    return Err(input.failure(
                        FailureKind::DependencyViolation,
                        "add_sum",
                        format!(
                            "Can't add literal {} to node {} children. Not a data variable",
                            value, nid
                        ),
                    ));
                }
                local_dependencies.push(var);
            } else {
                if literal.is_negative() {
                    return Err(input.failure(
                        FailureKind::DependencyViolation,
                        "add_sum",
                        format!(
                            "Can't add negative literal {} to node {} children. Not NNF",
                            value, nid
                        ),
                    ));
                }
                let child = self.nodes.get(var).ok_or_else(|| {
                    input.failure(
                        FailureKind::DependencyViolation,
                        "add_sum",
                        format!(
                            "Can't add literal {} to node {} children. Invalid node Id {}",
                            value, nid, var
                        ),
                    )
                })?;
                dependencies = merge_variables(&dependencies, &child.dependencies);
            }
            if !weak && children.len() == 2 {
                break;
            }
        }
        if weak && children.len() < 2 {
            return Err(input.failure(
                FailureKind::DependencyViolation,
                "add_sum",
                format!("Weak sum node {} needs at least two children", nid),
            ));
        }
        if !local_dependencies.is_empty() {
            local_dependencies.sort_unstable();
            local_dependencies = deduplicate(local_dependencies);
            dependencies = merge_variables(&dependencies, &local_dependencies);
        }
        let mut line_ended = false;
        if !weak {
            // Prove that the two children cannot hold at once.
            self.litset.clear();
            self.litset.assign(children[0]);
            self.litset.assign(children[1]);
            let outcome = self
                .check_rup(input, cid, ClauseType::Structural)
                .map_err(|mut failure| {
                    if failure.kind == FailureKind::RupFailure {
                        failure.kind = FailureKind::MutexFailure;
                    }
                    failure
                })?;
            line_ended = outcome.line_ended;
        }
        if !line_ended {
            input.require_eol("add_sum")?;
        }
        let node = Node {
            node_type: NodeType::Sum,
            first_cid: cid,
            children: children.clone(),
            dependencies,
        };
        self.install_node(input, nid, node)?;
        // Defining clauses: (¬n ∨ a ∨ b) and (n ∨ ¬aᵢ) for each child.
        let mut first_clause: Vector<Literal> = Vector::new();
        first_clause.push(-nid.literal());
        for &child in &children {
            first_clause.push(child);
        }
        self.emit_defining_clause(input, cid, &first_clause, ClauseType::Tseitin)?;
        for (index, &child) in children.iter().enumerate() {
            let literals = [nid.literal(), -child];
            self.emit_defining_clause(
                input,
                Clause::new(cid.index + 1 + index as u32),
                &literals,
                ClauseType::Tseitin,
            )?;
        }
        self.counters.tseitin_clauses += children.len() + 1;
        self.logger.info(
            3,
            format!(
                "Processed {}sum {} addition",
                if weak { "weak " } else { "" },
                nid
            ),
        );
        Ok(())
    }

    /// Render the POG for high verbosity levels.
    fn show_pog(&self) {
        puts!("CPOG Operations\n");
        for (id, node) in self.nodes.iter() {
            puts!("{}{}: (", node.node_type.letter(), id);
            for (index, &child) in node.children.iter().enumerate() {
                if index > 0 {
                    puts!(", ");
                }
                puts!("{}", child);
            }
            puts!(")\n");
            for offset in 0..=node.children.len() as u32 {
                let cid = Clause::new(node.first_cid.index + offset);
                if self.clause_db.find(cid).is_some() {
                    puts!("  {}\n", self.clause_db.clause_to_string(cid));
                }
            }
        }
    }

    /// Delete tautological input clauses; they are entailed by any POG.
    fn clear_tautologies(&mut self) {
        let mut count = 0_usize;
        let mut location = self.clause_db.find(Clause::new(1));
        while let Some(current) = location {
            let cid = self.clause_db.id_at(current);
            if cid.index > self.formula.clauses {
                break;
            }
            if self.clause_db.clause_type(current) == ClauseType::Input {
                let tautology = match self.clause_db.literals(current) {
                    Some(literals) => !rup_setup(&mut self.litset, literals),
                    None => false,
                };
                if tautology {
                    self.clause_db.delete(current);
                    count += 1;
                    self.logger
                        .data(2, format!("Clause #{}. Tautology (deleted)", cid));
                }
            }
            location = self.clause_db.next_location(current);
        }
        if count > 0 {
            self.counters.implicit_deletions += count;
            self.logger
                .data(1, format!("{} input clause tautologies deleted", count));
        }
    }

    /// Close the POG after the proof has been processed: verify the root
    /// state and implicitly delete the remaining input clauses.
    ///
    /// Returns the root literal (0 for proofs of unsatisfiability).
    fn close_pog(&mut self, file: &str, line: usize) -> Result<i32> {
        if self.declared_unsatisfiable {
            self.logger
                .data(1, "Completed processing of CPOG file");
            return Ok(0);
        }
        if !self.root_clause_added {
            return Err(CheckFailure::new(
                FailureKind::IntegrityFailure,
                file,
                line,
                "close_pog",
                format!("Unit clause for root {} not added", self.declared_root),
            ));
        }
        self.logger
            .data(1, "Completed processing of CPOG file");
        if self.flags.check_delete
            && (self.counters.explicit_deletions as u32) < self.formula.clauses
        {
            self.clear_tautologies();
            self.run_implicit_deletion(file, line)?;
        }
        Ok(self.declared_root)
    }

    /// Reverse-implication pass: prove every remaining input clause entailed
    /// by the POG, optionally with a pool of worker threads.
    fn run_implicit_deletion(&mut self, file: &str, line: usize) -> Result<()> {
        let root_literal = Literal::new(self.declared_root);
        let root_var = root_literal.var();
        let fanouts = build_fanouts(&self.nodes, self.formula.variables, self.variable_limit);
        let total = self.formula.clauses;
        if total == 0 {
            return Ok(());
        }
        let threads = self.flags.threads.max(1);
        let mut block = (total + threads as u32 - 1) / threads as u32;
        if block > config::CLAUSE_DELETION_BLOCK {
            block = config::CLAUSE_DELETION_BLOCK;
        }
        let mut ranges: Vec<(u32, u32)> = Vec::new();
        let mut cid_min = 1;
        while cid_min <= total {
            let cid_max = (cid_min + block - 1).min(total);
            ranges.push((cid_min, cid_max));
            cid_min = cid_max + 1;
        }
        let remaining = total as usize - self.counters.explicit_deletions;
        let interval = (remaining / config::REPORT_MAX_COUNT)
            .max(config::REPORT_MIN_INTERVAL)
            .min(config::REPORT_MAX_INTERVAL);
        let context = DeletionContext {
            clause_db: &self.clause_db,
            nodes: &self.nodes,
            fanouts: &fanouts,
            root_var,
            input_clauses: total,
            file,
            line,
            logger: self.logger,
            next_range: Mutex::new(0),
            ranges,
            report: Mutex::new(ReportState::new(interval)),
        };
        let stats = if threads == 1 {
            deletion_worker(&context)?
        } else {
            self.logger
                .data(1, format!("Running deletion with {} threads", threads));
            run_deletion_pool(&context, threads)?
        };
        self.counters.implicit_deletions += stats.deletions;
        self.counters.events += stats.events;
        if self.counters.implicit_deletions > 0 {
            self.logger.data(
                1,
                format!(
                    "Implicitly deleted {} input clauses. {} events",
                    self.counters.implicit_deletions, self.counters.events
                ),
            );
        }
        Ok(())
    }

    /// Evaluate the POG bottom-up over the given per-variable weights.
    ///
    /// `weights` is indexed by variable; slot 0 is unused.
    fn ring_evaluate(&self, weights: &[Number], file: &str) -> Result<Number> {
        if self.declared_unsatisfiable {
            return Ok(Number::zero());
        }
        let root_literal = Literal::new(self.declared_root);
        let root_var = root_literal.var();
        if root_var.0 <= self.formula.variables {
            // The root is an input literal; its weight is the count density.
            let weight = &weights[root_var.as_offset()];
            return Ok(if root_literal.is_negative() {
                weight.one_minus()
            } else {
                weight.clone()
            });
        }
        if root_literal.is_negative() {
            return Err(CheckFailure::new(
                FailureKind::IntegrityFailure,
                file,
                0,
                "ring_evaluate",
                format!("Invalid root literal {}", self.declared_root),
            ));
        }
        let first = self.nodes.first_id;
        let mut values: Vector<Number> = Vector::new();
        for id in first..=root_var.0 {
            let node = self.nodes.get(Variable::new(id)).ok_or_else(|| {
                CheckFailure::new(
                    FailureKind::IntegrityFailure,
                    file,
                    0,
                    "ring_evaluate",
                    format!("Invalid type for node {}", id),
                )
            })?;
            let mut value = match node.node_type {
                NodeType::Product | NodeType::Skolem => Number::from_u32(1),
                NodeType::Sum => Number::zero(),
                NodeType::None => unreachable(),
            };
            if node.node_type != NodeType::Skolem {
                for &child in &node.children {
                    let var = child.var();
                    let mut child_value = if var.0 <= self.formula.variables {
                        weights[var.as_offset()].clone()
                    } else {
                        values[(var.0 - first) as usize].clone()
                    };
                    if child.is_negative() {
                        child_value = child_value.one_minus();
                    }
                    value = if node.node_type == NodeType::Product {
                        value.mul(&child_value)
                    } else {
                        value.add(&child_value)
                    };
                }
            }
            self.logger
                .info(3, format!("Ring value for node {}: {}", id, value));
            values.push(value);
        }
        Ok(values.last().clone())
    }

    /// Unweighted model counting: evaluate with weight ½ everywhere and
    /// scale by two to the number of (data) variables.
    fn count_regular(&self, file: &str) -> Result<Number> {
        let data_variables = self.formula.data_variable_count();
        if self.formula.projected {
            self.logger
                .data(2, format!("{} data variables", data_variables));
        }
        let half = Number::from_u32(1).scale2(-1);
        let weights = Vector::fill(
            Variable::new(self.formula.variables).array_size(),
            half,
        );
        let density = self.ring_evaluate(&weights, file)?;
        Ok(density.scale2(data_variables as i32))
    }

    /// Weighted model counting over the weights declared in the CNF file.
    ///
    /// Missing weights follow the usual conventions: an entirely unweighted
    /// variable counts as ½ with a rescale of 2, a lone negative weight
    /// determines the positive one, and weights that do not sum to one are
    /// normalized with their sum folded into the rescale factor.
    fn count_weighted(&self, file: &str) -> Result<Option<Number>> {
        if !self.formula.weighted {
            return Ok(None);
        }
        let mut rescale = Number::from_u32(1);
        let size = Variable::new(self.formula.variables).array_size();
        let mut weights: Vector<Number> = Vector::fill(size, Number::zero());
        for var in 1..=self.formula.variables as usize {
            let positive = &self.formula.positive_weight[var];
            let negative = &self.formula.negative_weight[var];
            weights[var] = match (positive, negative) {
                (None, None) => {
                    let sum = Number::from_u32(2);
                    rescale = rescale.mul(&sum);
                    sum.recip()
                }
                (Some(positive), None) => positive.clone(),
                (None, Some(negative)) => negative.one_minus(),
                (Some(positive), Some(negative)) => {
                    let sum = positive.add(negative);
                    if sum.is_one() {
                        positive.clone()
                    } else {
                        let reciprocal = sum.recip();
                        if !reciprocal.is_valid() {
                            return Err(CheckFailure::new(
                                FailureKind::Weight,
                                file,
                                0,
                                "count_weighted",
                                format!(
                                    "Could not get reciprocal of summed weights for variable {}",
                                    var
                                ),
                            ));
                        }
                        rescale = rescale.mul(&sum);
                        positive.mul(&reciprocal)
                    }
                }
            };
        }
        let value = self.ring_evaluate(&weights, file)?;
        Ok(Some(value.mul(&rescale)))
    }
}

/// Sorted-merge of two variable sets.
fn merge_variables(left: &[Variable], right: &[Variable]) -> Vector<Variable> {
    let mut result = Vector::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] < right[j] {
            result.push(left[i]);
            i += 1;
        } else if right[j] < left[i] {
            result.push(right[j]);
            j += 1;
        } else {
            result.push(left[i]);
            i += 1;
            j += 1;
        }
    }
    while i < left.len() {
        result.push(left[i]);
        i += 1;
    }
    while j < right.len() {
        result.push(right[j]);
        j += 1;
    }
    result
}

/// The first variable two sorted sets share, if any.
fn common_variable(left: &[Variable], right: &[Variable]) -> Option<Variable> {
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] == right[j] {
            return Some(left[i]);
        }
        if left[i] < right[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    None
}

/// The first adjacent duplicate in a sorted set, if any.
fn find_duplicate(sorted: &[Variable]) -> Option<Variable> {
    sorted
        .windows(2)
        .find(|pair| pair[0] == pair[1])
        .map(|pair| pair[0])
}

/// Collapse adjacent duplicates in a sorted set.
fn deduplicate(sorted: Vector<Variable>) -> Vector<Variable> {
    let mut result = Vector::with_capacity(sorted.len());
    for &var in &sorted {
        if result.is_empty() || *result.last() != var {
            result.push(var);
        }
    }
    result
}

/// Fan-out adjacency of the POG, built once before implicit deletion.
struct FanOuts {
    /// Nodes having `-v` as a child, indexed by (input) variable.
    negative: Array<Variable, Vector<u32>>,
    /// Nodes having `+v` as a child, indexed by variable.
    positive: Array<Variable, Vector<u32>>,
}

impl FanOuts {
    /// The nodes that receive an event when `literal` becomes true.
    fn targets(&self, literal: Literal) -> &[u32] {
        let var = literal.var();
        if literal.is_negative() {
            &self.positive[var]
        } else {
            &self.negative[var]
        }
    }
}

fn build_fanouts(nodes: &NodeTable, input_variables: u32, variable_limit: u32) -> FanOuts {
    let mut fanouts = FanOuts {
        negative: Array::new(Vector::new(), Variable::new(input_variables).array_size()),
        positive: Array::new(Vector::new(), Variable::new(variable_limit).array_size()),
    };
    for (id, node) in nodes.iter() {
        for &child in &node.children {
            let var = child.var();
            if child.is_negative() {
                fanouts.negative[var].push(id.0);
            } else {
                fanouts.positive[var].push(id.0);
            }
        }
    }
    fanouts
}

/// Per-worker propagation state for reverse implication: saturating event
/// counters and a min-heap of pending node ids.
struct Propagator {
    first_id: u32,
    /// Event count per node, saturating at 2.
    events: Vector<u8>,
    /// Min-heap of node ids with pending events.
    heap: BoundedVector<u32>,
}

impl Propagator {
    fn new(first_id: u32, node_range: usize) -> Propagator {
        Propagator {
            first_id,
            events: Vector::fill(node_range, 0),
            heap: BoundedVector::with_capacity(node_range),
        }
    }
    /// Record an event for a node; enqueue it on the first event.
    fn add_event(&mut self, var: u32) {
        let index = (var - self.first_id) as usize;
        let previous = self.events[index];
        if previous < 2 {
            self.events[index] = previous + 1;
        }
        if previous == 0 {
            self.heap.push(var);
            self.sift_up(self.heap.len() - 1);
        }
    }
    /// Pop the smallest pending node id.
    fn pop(&mut self) -> Option<u32> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap[0];
        let last = self.heap.pop().unwrap();
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.sift_down(0);
        }
        Some(top)
    }
    /// Read and clear the event count of a node.
    fn take_events(&mut self, var: u32) -> u8 {
        let index = (var - self.first_id) as usize;
        let count = self.events[index];
        self.events[index] = 0;
        count
    }
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index] < self.heap[parent] {
                self.heap.swap(index, parent);
                index = parent;
            } else {
                return;
            }
        }
    }
    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            if left >= self.heap.len() {
                return;
            }
            let right = left + 1;
            let mut smallest = index;
            if self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == index {
                return;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
    /// Drop all pending events, e.g. after an early conflict.
    fn drain(&mut self) {
        while let Some(var) = self.pop() {
            self.take_events(var);
        }
    }
}

/// Shared, read-only state of the implicit-deletion phase plus the mutexed
/// work queue and progress report.
struct DeletionContext<'a> {
    clause_db: &'a ClauseDatabase,
    nodes: &'a NodeTable,
    fanouts: &'a FanOuts,
    root_var: Variable,
    input_clauses: u32,
    file: &'a str,
    line: usize,
    logger: &'a Logger,
    next_range: Mutex<usize>,
    ranges: Vec<(u32, u32)>,
    report: Mutex<ReportState>,
}

/// Totals a worker accumulated.
#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    deletions: usize,
    events: u64,
}

/// Progress pacing for the deletion phase.
struct ReportState {
    interval: usize,
    deletions: usize,
    events: u64,
    reported: usize,
    start: Instant,
    last: Instant,
}

impl ReportState {
    fn new(interval: usize) -> ReportState {
        let now = Instant::now();
        ReportState {
            interval,
            deletions: 0,
            events: 0,
            reported: 0,
            start: now,
            last: now,
        }
    }
    /// Fold in a worker's progress; emit a report line when due.
    fn update(&mut self, logger: &Logger, stats: WorkerStats) {
        self.deletions += stats.deletions;
        self.events += stats.events;
        if self.deletions >= self.reported + self.interval {
            let elapsed = self.start.elapsed().as_secs_f64();
            let since_last = self.last.elapsed().as_secs_f64().max(1e-9);
            let deleted = self.deletions - self.reported;
            logger.data(
                1,
                format!(
                    "Elapsed = {:.3}. Deleted {} clauses in {:.3} seconds. Total deletions = {}. \
                     Deletions/s = {:.2}",
                    elapsed,
                    deleted,
                    since_last,
                    self.deletions,
                    deleted as f64 / since_last
                ),
            );
            self.reported = self.deletions;
            self.last = Instant::now();
        }
    }
}

/// Run reverse implication for one input clause.
///
/// Asserting every clause literal false must falsify the root.
fn check_input_clause(
    context: &DeletionContext,
    propagator: &mut Propagator,
    cid: Clause,
    literals: &[Literal],
) -> std::result::Result<u64, CheckFailure> {
    let mut events = 0_u64;
    for &literal in literals {
        for &target in context.fanouts.targets(-literal) {
            propagator.add_event(target);
        }
    }
    let mut conflict = false;
    while let Some(var) = propagator.pop() {
        events += 1;
        let count = propagator.take_events(var);
        let node = match context.nodes.get(Variable::new(var)) {
            Some(node) => node,
            None => continue,
        };
        let threshold = if node.node_type == NodeType::Sum {
            node.children.len()
        } else {
            1
        };
        if count as usize >= threshold {
            if var == context.root_var.0 {
                conflict = true;
                break;
            }
            for &target in context.fanouts.targets(-Variable::new(var).literal()) {
                propagator.add_event(target);
            }
        }
    }
    propagator.drain();
    if !conflict {
        return Err(CheckFailure::new(
            FailureKind::ImplicitDeletionFailed,
            context.file,
            context.line,
            "check_input_clause",
            format!(
                "RUP failure for input clause {}. No conflict detected",
                cid
            ),
        ));
    }
    Ok(events)
}

/// Process ranges from the shared queue until it runs dry.
fn deletion_worker(context: &DeletionContext) -> std::result::Result<WorkerStats, CheckFailure> {
    let node_range = context.nodes.nodes.len();
    let mut propagator = Propagator::new(context.nodes.first_id, node_range);
    let mut total = WorkerStats::default();
    loop {
        let range = {
            let mut next = context.next_range.lock().unwrap();
            if *next >= context.ranges.len() {
                break;
            }
            let range = context.ranges[*next];
            *next += 1;
            range
        };
        let mut stats = WorkerStats::default();
        let (cid_min, cid_max) = range;
        let mut location = context.clause_db.find(Clause::new(cid_min));
        while let Some(current) = location {
            let cid = context.clause_db.id_at(current);
            if cid.index > cid_max || cid.index > context.input_clauses {
                break;
            }
            if context.clause_db.clause_type(current) == ClauseType::Input {
                let literals = context
                    .clause_db
                    .literals(current)
                    .expect("input clause without literals");
                stats.events += check_input_clause(context, &mut propagator, cid, literals)?;
                stats.deletions += 1;
            }
            location = context.clause_db.next_location(current);
        }
        total.deletions += stats.deletions;
        total.events += stats.events;
        let mut report = context.report.lock().unwrap();
        report.update(context.logger, stats);
    }
    Ok(total)
}

/// Fan the deletion work out to a pool of scoped worker threads.
fn run_deletion_pool(
    context: &DeletionContext,
    threads: usize,
) -> std::result::Result<WorkerStats, CheckFailure> {
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for _ in 0..threads {
            handles.push(scope.spawn(|| deletion_worker(context)));
        }
        let mut total = WorkerStats::default();
        let mut first_failure = None;
        for handle in handles {
            match handle.join().expect("deletion worker panicked") {
                Ok(stats) => {
                    total.deletions += stats.deletions;
                    total.events += stats.events;
                }
                Err(failure) => {
                    if first_failure.is_none() {
                        first_failure = Some(failure);
                    }
                }
            }
        }
        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(total),
        }
    })
}

/// Run the checker over the files named on the command line.
fn run(flags: &Flags, logger: &Logger) -> Result<()> {
    let mut cnf_input = open_input(&flags.cnf_filename)?;
    let (formula, clause_db) = parse_cnf(&mut cnf_input, logger)?;
    let mut checker = Checker::new(formula, clause_db, flags, logger);
    if logger.verbosity >= 3 {
        puts!("CNF File. {} clauses\n", checker.formula.clauses);
        show_all_clauses(&checker.clause_db);
    }
    if let Some(cpog_filename) = &flags.cpog_filename {
        let mut proof_input = open_input(cpog_filename)?;
        {
            let _timer = Timer::name("proof processing time");
            checker.process_cpog(&mut proof_input)?;
        }
        if logger.verbosity >= 3 {
            checker.show_pog();
            puts!("All clauses:\n");
            show_all_clauses(&checker.clause_db);
        }
        let line = proof_input.line();
        let root = checker.close_pog(cpog_filename, line)?;
        if root == 0 {
            if !flags.check_add {
                logger.banner("NOTHING CHECKED.  CPOG representation not verified");
            } else if !checker.proved_unsatisfiable {
                return Err(CheckFailure::new(
                    FailureKind::IntegrityFailure,
                    cpog_filename,
                    line,
                    "run",
                    "POG declared as unsatisfiable, but empty clause not added".to_string(),
                ));
            } else {
                logger.banner(
                    "FULL-PROOF SUCCESS.  CPOG representation of unsatisfiable POG verified",
                );
            }
        } else {
            logger.data(2, format!("Final root literal {}", root));
            if !flags.check_add && !flags.check_delete {
                logger.banner("NOTHING CHECKED.  CPOG representation not verified");
            } else if !flags.check_add {
                logger.banner("CLAUSE DELETIONS VALID.  CPOG representation partially verified");
            } else if !flags.check_delete {
                logger.banner("CLAUSE ADDITIONS VALID.  CPOG representation partially verified");
            } else {
                logger.banner("FULL-PROOF SUCCESS.  CPOG representation verified");
            }
        }
        if flags.weak {
            logger.data(1, "Weak mode equivalence checked");
        } else {
            let start_operations = number::operation_count();
            let regular = checker.count_regular(cpog_filename)?;
            if regular.is_valid() {
                logger.data(0, format!("Regular model count = {}", regular));
                logger.data(
                    0,
                    format!(
                        "Regular count required {} binary operations",
                        number::operation_count() - start_operations
                    ),
                );
            }
            let start_operations = number::operation_count();
            if let Some(weighted) = checker.count_weighted(cpog_filename)? {
                if weighted.is_valid() {
                    logger.data(0, format!("Weighted model count = {}", weighted));
                    logger.data(
                        0,
                        format!(
                            "Weighted count required {} binary operations",
                            number::operation_count() - start_operations
                        ),
                    );
                }
            }
        }
    }
    if logger.verbosity >= 2 {
        print_key_value(
            "clause database (MB)",
            format_memory_usage(checker.clause_db.heap_space()),
        );
        print_key_value(
            "node table (MB)",
            format_memory_usage(checker.nodes.heap_space()),
        );
    }
    Ok(())
}

/// Print every stored clause, for high verbosity levels.
fn show_all_clauses(clause_db: &ClauseDatabase) {
    let mut location = clause_db.find(Clause::new(1));
    while let Some(current) = location {
        puts!("{}\n", clause_db.clause_to_string(clause_db.id_at(current)));
        location = clause_db.next_location(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_flags() -> Flags {
        Flags {
            verbosity: 0,
            logfile: None,
            check_add: true,
            check_delete: true,
            lenient: false,
            early_rup: true,
            explicit_skolem: false,
            weak: false,
            threads: 1,
            cnf_filename: "<cnf>".to_string(),
            cpog_filename: Some("<cpog>".to_string()),
        }
    }

    struct Outcome {
        root: i32,
        regular: Option<Number>,
        weighted: Option<Number>,
    }

    /// Drive the whole checker over in-memory inputs.
    fn check_with_flags(cnf: &str, cpog: &str, flags: &Flags) -> Result<Outcome> {
        let logger = Logger::new(flags.verbosity, None);
        let mut cnf_input = Input::new(Box::new(cnf.as_bytes().iter().cloned()), "<cnf>");
        let (formula, clause_db) = parse_cnf(&mut cnf_input, &logger)?;
        let mut checker = Checker::new(formula, clause_db, flags, &logger);
        let mut proof_input = Input::new(Box::new(cpog.as_bytes().iter().cloned()), "<cpog>");
        checker.process_cpog(&mut proof_input)?;
        let line = proof_input.line();
        let root = checker.close_pog("<cpog>", line)?;
        if root == 0 && !checker.proved_unsatisfiable {
            return Err(CheckFailure::new(
                FailureKind::IntegrityFailure,
                "<cpog>",
                line,
                "check_with_flags",
                "POG declared as unsatisfiable, but empty clause not added".to_string(),
            ));
        }
        if flags.weak {
            return Ok(Outcome {
                root,
                regular: None,
                weighted: None,
            });
        }
        let regular = checker.count_regular("<cpog>")?;
        let weighted = checker.count_weighted("<cpog>")?;
        Ok(Outcome {
            root,
            regular: Some(regular),
            weighted,
        })
    }

    fn check(cnf: &str, cpog: &str) -> Result<Outcome> {
        check_with_flags(cnf, cpog, &test_flags())
    }

    fn failure_kind(result: Result<Outcome>) -> Option<FailureKind> {
        result.err().map(|failure| failure.kind)
    }

    const TRIVIAL_SAT_CNF: &str = "p cnf 1 1\n1 0\n";
    const TRIVIAL_SAT_CPOG: &str = "r 2\n2 p 2 1 0\n4 a 2 0 1 2\n";

    #[test]
    fn trivial_unsatisfiable_formula() {
        let outcome = check("p cnf 1 2\n1 0\n-1 0\n", "r 0\n3 a 0 1 2 0\n").expect("check failed");
        assert_eq!(outcome.root, 0);
        assert!(outcome.regular.unwrap().is_zero());
        assert!(outcome.weighted.is_none());
    }

    #[test]
    fn trivial_satisfiable_formula() {
        let outcome = check(TRIVIAL_SAT_CNF, TRIVIAL_SAT_CPOG).expect("check failed");
        assert_eq!(outcome.root, 2);
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(1));
    }

    #[test]
    fn xor_as_sum_of_products() {
        let cnf = "p cnf 2 2\n1 2 0\n-1 -2 0\n";
        let cpog = "r 5\n\
                    3 p 3 1 -2 0\n\
                    6 p 4 -1 2 0\n\
                    9 s 5 3 4 4 7 0\n\
                    12 a 5 -1 2 0 10 3 0\n\
                    13 a 5 1 0 10 11 6 1 0\n\
                    14 a 5 0 13 12 2 0\n";
        let outcome = check(cnf, cpog).expect("check failed");
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(2));
    }

    #[test]
    fn projected_count_with_skolem_nodes() {
        let cnf = "c t pmc\n\
                   c p show 1 2 0\n\
                   p cnf 3 2\n\
                   1 3 0\n\
                   2 -3 0\n";
        let cpog = "r 8\n\
                    3 t 4 -3 0\n\
                    4 p 5 1 4 0\n\
                    7 t 6 3 0\n\
                    8 p 7 -1 2 6 0\n\
                    12 s 8 5 7 5 9 0\n\
                    15 a 8 -1 0 13 14 4 3 0\n\
                    16 a 8 0 15 13 14 7 8 2 1 0\n";
        let outcome = check(cnf, cpog).expect("check failed");
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(3));
    }

    #[test]
    fn weighted_count() {
        let cnf = "p cnf 1 1\n\
                   c t wmc\n\
                   c p weight 1 0.25 0\n\
                   c p weight -1 0.75 0\n\
                   1 0\n";
        let outcome = check(cnf, TRIVIAL_SAT_CPOG).expect("check failed");
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(1));
        assert_eq!(outcome.weighted, Some(Number::parse("0.25")));
    }

    #[test]
    fn rup_failure_is_fatal() {
        // The hint list ends without reaching a conflict.
        let result = check(TRIVIAL_SAT_CNF, "r 2\n2 p 2 1 0\n4 a 2 0 1 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::RupFailure));
    }

    #[test]
    fn conflict_before_terminator_requires_early_rup() {
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 1 2 3 0\n";
        assert!(check(TRIVIAL_SAT_CNF, cpog).is_ok());
        let mut flags = test_flags();
        flags.early_rup = false;
        let result = check_with_flags(TRIVIAL_SAT_CNF, cpog, &flags);
        assert_eq!(failure_kind(result), Some(FailureKind::RupFailure));
    }

    #[test]
    fn nonpropagating_hint_is_fatal_unless_lenient() {
        // Hint clause 3 is satisfied by the assignment, so it cannot propagate.
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 3 1 2 0\n";
        let result = check(TRIVIAL_SAT_CNF, cpog);
        assert_eq!(failure_kind(result), Some(FailureKind::RupFailure));
        let mut flags = test_flags();
        flags.lenient = true;
        assert!(check_with_flags(TRIVIAL_SAT_CNF, cpog, &flags).is_ok());
    }

    #[test]
    fn incompatible_hint_types_are_rejected() {
        // Clause 4 has type root; root hints may only justify input deletion.
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 1 2 0\n5 a 2 -1 0 4 0\n";
        let result = check(TRIVIAL_SAT_CNF, cpog);
        assert_eq!(failure_kind(result), Some(FailureKind::RupFailure));
    }

    #[test]
    fn explicit_input_deletion() {
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 1 2 0\nd 1 4 3 0\n";
        let outcome = check(TRIVIAL_SAT_CNF, cpog).expect("check failed");
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(1));
    }

    #[test]
    fn deleting_an_input_clause_twice_fails() {
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 1 2 0\nd 1 4 3 0\nd 1 4 3 0\n";
        let result = check(TRIVIAL_SAT_CNF, cpog);
        assert_eq!(failure_kind(result), Some(FailureKind::AlreadyDeleted));
    }

    #[test]
    fn batch_deletion_of_forward_clauses() {
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 1 2\n5 a 2 -1 0 2 0\nD 5 0\n";
        assert!(check(TRIVIAL_SAT_CNF, cpog).is_ok());
        // Input clauses cannot go through the batch command.
        let bad = "r 2\n2 p 2 1 0\n4 a 2 0 1 2\nD 1 0\n";
        assert_eq!(failure_kind(check(TRIVIAL_SAT_CNF, bad)), Some(FailureKind::Parse));
    }

    #[test]
    fn missing_root_clause_is_an_integrity_failure() {
        let result = check(TRIVIAL_SAT_CNF, "r 2\n2 p 2 1 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::IntegrityFailure));
    }

    #[test]
    fn unproved_unsatisfiability_claim_fails() {
        let result = check("p cnf 1 1\n1 0\n", "r 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::IntegrityFailure));
    }

    #[test]
    fn implicit_deletion_failure_is_reported() {
        // The POG for variable 1 alone does not entail the clause (2).
        let cnf = "p cnf 2 2\n1 0\n2 0\n";
        let cpog = "r 3\n3 p 3 1 0\n5 a 3 0 1 3 0\n";
        let result = check(cnf, cpog);
        assert_eq!(
            failure_kind(result),
            Some(FailureKind::ImplicitDeletionFailed)
        );
    }

    #[test]
    fn tautological_input_clauses_are_deleted_implicitly() {
        let cnf = "p cnf 1 1\n1 -1 0\n";
        let cpog = "r 2\n2 p 2 0\n";
        let outcome = check(cnf, cpog).expect("check failed");
        // A degree-0 product as root makes the formula a tautology.
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(2));
    }

    #[test]
    fn product_dependency_sets_must_be_disjoint() {
        let cnf = "p cnf 2 1\n1 2 0\n";
        let result = check(cnf, "r 3\n2 p 3 1 1 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::DependencyViolation));
        let shared = "r 5\n2 p 3 1 0\n4 p 4 1 2 0\n7 p 5 3 4 0\n";
        let result = check(cnf, shared);
        assert_eq!(failure_kind(result), Some(FailureKind::DependencyViolation));
    }

    #[test]
    fn negative_node_children_violate_nnf() {
        let cnf = "p cnf 2 1\n1 2 0\n";
        let result = check(cnf, "r 4\n2 p 3 1 0\n4 p 4 -3 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::DependencyViolation));
    }

    #[test]
    fn sum_children_must_be_mutually_exclusive() {
        let cnf = "p cnf 2 1\n1 2 0\n";
        let cpog = "r 5\n2 p 3 1 0\n4 p 4 2 0\n6 s 5 3 4 0\n";
        let result = check(cnf, cpog);
        assert_eq!(failure_kind(result), Some(FailureKind::MutexFailure));
    }

    #[test]
    fn weak_sums_require_weak_mode() {
        let cnf = "p cnf 2 1\n1 2 0\n";
        let cpog = "r 3\n2 S 3 1 2 0\n5 a 3 0 3 4 1 0\n";
        assert_eq!(failure_kind(check(cnf, cpog)), Some(FailureKind::Parse));
        let mut flags = test_flags();
        flags.weak = true;
        let outcome = check_with_flags(cnf, cpog, &flags).expect("check failed");
        assert_eq!(outcome.root, 3);
    }

    #[test]
    fn skolem_nodes_require_projected_mode() {
        let result = check("p cnf 1 1\n1 0\n", "r 2\n2 t 2 -1 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::Parse));
    }

    #[test]
    fn skolem_children_must_be_projection_variables() {
        let cnf = "c t pmc\nc p show 1 0\np cnf 2 1\n1 0\n";
        let result = check(cnf, "r 3\n2 t 3 1 0\n");
        assert_eq!(failure_kind(result), Some(FailureKind::DependencyViolation));
    }

    #[test]
    fn skipping_addition_checks_discards_hints() {
        // The hint list is nonsense, but -A mode never looks at it.
        let cpog = "r 2\n2 p 2 1 0\n4 a 2 0 99 98 0\n";
        assert_eq!(failure_kind(check(TRIVIAL_SAT_CNF, cpog)), Some(FailureKind::RupFailure));
        let mut flags = test_flags();
        flags.check_add = false;
        assert!(check_with_flags(TRIVIAL_SAT_CNF, cpog, &flags).is_ok());
    }

    #[test]
    fn results_are_reproducible() {
        let first = check(TRIVIAL_SAT_CNF, TRIVIAL_SAT_CPOG).expect("check failed");
        let second = check(TRIVIAL_SAT_CNF, TRIVIAL_SAT_CPOG).expect("check failed");
        assert_eq!(first.regular, second.regular);
        assert_eq!(first.weighted, second.weighted);
    }

    #[test]
    fn parallel_deletion_matches_sequential() {
        let cnf = "p cnf 2 2\n1 2 0\n-1 -2 0\n";
        let cpog = "r 5\n\
                    3 p 3 1 -2 0\n\
                    6 p 4 -1 2 0\n\
                    9 s 5 3 4 4 7 0\n\
                    12 a 5 -1 2 0 10 3 0\n\
                    13 a 5 1 0 10 11 6 1 0\n\
                    14 a 5 0 13 12 2 0\n";
        let mut flags = test_flags();
        flags.threads = 4;
        let outcome = check_with_flags(cnf, cpog, &flags).expect("check failed");
        assert_eq!(outcome.regular.unwrap(), Number::from_u32(2));
    }

    #[test]
    fn variable_set_helpers() {
        fn vars(values: &[u32]) -> Vector<Variable> {
            values.iter().map(|&value| Variable::new(value)).collect()
        }
        assert_eq!(merge_variables(&vars(&[1, 3]), &vars(&[2, 3, 5])), vars(&[1, 2, 3, 5]));
        assert_eq!(common_variable(&vars(&[1, 4]), &vars(&[2, 4])), Some(Variable::new(4)));
        assert_eq!(common_variable(&vars(&[1, 4]), &vars(&[2, 5])), None);
        assert_eq!(find_duplicate(&vars(&[1, 2, 2])), Some(Variable::new(2)));
        assert_eq!(deduplicate(vars(&[1, 1, 2])), vars(&[1, 2]));
    }

    #[test]
    fn propagator_pops_in_id_order() {
        let mut propagator = Propagator::new(3, 4);
        propagator.add_event(6);
        propagator.add_event(4);
        propagator.add_event(5);
        propagator.add_event(6);
        assert_eq!(propagator.pop(), Some(4));
        assert_eq!(propagator.take_events(4), 1);
        assert_eq!(propagator.pop(), Some(5));
        assert_eq!(propagator.take_events(5), 1);
        assert_eq!(propagator.pop(), Some(6));
        assert_eq!(propagator.take_events(6), 2);
        assert_eq!(propagator.pop(), None);
    }
}
