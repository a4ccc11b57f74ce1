//! The Boreal grammar: terminal alphabet and production rules.
//!
//! Rules are kept as text and parsed at load time; the line number of a rule
//! is its production number, and production numbers are what the parse table
//! and the semantic-action dispatch agree on. Production 0 is the synthetic
//! augmented start.

use std::collections::HashMap;

use thiserror::Error;

/// Interned grammar symbol: terminals first, then non-terminals.
pub type SymbolId = u16;

/// Name used for the empty right-hand side in rule text.
pub const LAMBDA: &str = "Lambda";

/// Terminal alphabet in table-column order. `real` and `char` are reserved
/// words no rule admits, and `$` is end of input.
pub const TERMINALS: &[&str] = &[
    "program", "procedure", "function", "var", "integer", "boolean", "string", "real", "char",
    "begin", "end", "if", "then", "while", "do", "repeat", "until", "for", "to", "case", "of",
    "otherwise", "loop", "exit", "when", "return", "read", "write", "writeln", "or", "xor", "and",
    "not", "mod", "in", "max", "min", "true", "false", "id", "intlit", "strlit", "+", "-", "*",
    "/", "**", ":=", "=", "<>", "<", "<=", ">", ">=", "(", ")", ";", ":", ",", "$",
];

/// The production rules, one per line; line N is production N.
pub const RULES: &str = "\
goal -> decl_seq main_body
decl_seq -> decl_seq decl
decl_seq -> Lambda
decl -> program_header
decl -> var_decl
decl -> procedure_decl
decl -> function_decl
program_header -> program_name ;
program_name -> program id
var_decl -> var id : type_spec ;
type_spec -> integer
type_spec -> boolean
type_spec -> string
procedure_decl -> procedure_header sub_body ;
procedure_header -> procedure_name param_clause ;
procedure_name -> procedure id
function_decl -> function_header sub_body ;
function_header -> function_name param_clause : type_spec ;
function_name -> function id
param_clause -> ( param_list )
param_clause -> Lambda
param_list -> param_list , param
param_list -> param
param -> id : type_spec
param -> var id : type_spec
sub_body -> local_seq compound_stmt
local_seq -> local_seq var_decl
local_seq -> Lambda
main_body -> compound_stmt ;
compound_stmt -> begin_mark begin stmt_seq end
begin_mark -> Lambda
stmt_seq -> stmt_seq statement ;
stmt_seq -> Lambda
statement -> assign_stmt
statement -> call_stmt
statement -> if_stmt
statement -> while_stmt
statement -> repeat_stmt
statement -> for_stmt
statement -> case_stmt
statement -> loop_stmt
statement -> exit_stmt
statement -> return_stmt
statement -> read_stmt
statement -> write_stmt
statement -> compound_stmt
assign_stmt -> id := expression
call_stmt -> id
call_stmt -> id ( arg_list )
if_stmt -> if expression then statement
while_stmt -> while expression do statement
repeat_stmt -> repeat stmt_seq until expression
for_stmt -> for id := expression to expression do statement
case_stmt -> case expression of case_arm_seq case_else end
case_arm_seq -> case_arm_seq case_arm
case_arm_seq -> case_arm
case_arm -> intlit : statement ;
case_else -> otherwise : statement ;
case_else -> Lambda
loop_stmt -> loop stmt_seq end
exit_stmt -> exit when expression
return_stmt -> return
return_stmt -> return expression
read_stmt -> read ( read_list )
read_list -> read_list , id
read_list -> id
write_stmt -> write write_args
write_stmt -> writeln write_args
write_args -> ( arg_list )
write_args -> Lambda
arg_list -> arg_list , expression
arg_list -> expression
expression -> expression or conjunction
expression -> expression xor conjunction
expression -> conjunction
conjunction -> conjunction and negation
conjunction -> negation
negation -> not negation
negation -> relation
relation -> simple_expr = simple_expr
relation -> simple_expr <> simple_expr
relation -> simple_expr < simple_expr
relation -> simple_expr <= simple_expr
relation -> simple_expr > simple_expr
relation -> simple_expr >= simple_expr
relation -> simple_expr in ( arg_list )
relation -> simple_expr
simple_expr -> simple_expr + term
simple_expr -> simple_expr - term
simple_expr -> term
term -> term * factor
term -> term / factor
term -> term mod factor
term -> factor
factor -> unary ** factor
factor -> unary
unary -> + unary
unary -> - unary
unary -> primary
primary -> id
primary -> id ( arg_list )
primary -> intlit
primary -> strlit
primary -> true
primary -> false
primary -> ( expression )
primary -> max ( arg_list )
primary -> min ( arg_list )
";

/// Errors raised while interning the grammar text.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("rule {line} is missing '->'")]
    MissingArrow { line: usize },
    #[error("rule {line} has an empty left-hand side")]
    MissingLhs { line: usize },
    #[error("unknown symbol '{name}' in rule {line}")]
    UnknownSymbol { name: String, line: usize },
    #[error("terminal '{name}' appears on a left-hand side")]
    TerminalLhs { name: String },
    #[error("the grammar has no rules")]
    Empty,
}

/// One production. `text` keeps the original rule line for messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
    pub text: String,
}

/// Interned grammar: symbol tables plus the production list.
#[derive(Debug)]
pub struct Grammar {
    terminals: Vec<String>,
    nonterminals: Vec<String>,
    by_name: HashMap<String, SymbolId>,
    pub productions: Vec<Production>,
}

impl Grammar {
    /// Intern a grammar from a terminal alphabet and rule text. The start
    /// symbol is the left-hand side of the first rule; production 0 is the
    /// synthetic `S' -> start`.
    pub fn parse(terminals: &[&str], rules: &str) -> Result<Self, GrammarError> {
        let mut by_name = HashMap::new();
        let terminals: Vec<String> = terminals.iter().map(|s| s.to_string()).collect();
        for (i, name) in terminals.iter().enumerate() {
            by_name.insert(name.clone(), i as SymbolId);
        }

        // First pass: every left-hand side becomes a non-terminal.
        let mut nonterminals: Vec<String> = vec!["S'".to_string()];
        let lines: Vec<&str> = rules
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(GrammarError::Empty);
        }
        for (i, line) in lines.iter().enumerate() {
            let line_no = i + 1;
            let (lhs, _) = line
                .split_once("->")
                .ok_or(GrammarError::MissingArrow { line: line_no })?;
            let lhs = lhs.trim();
            if lhs.is_empty() {
                return Err(GrammarError::MissingLhs { line: line_no });
            }
            if by_name.contains_key(lhs) {
                if (by_name[lhs] as usize) < terminals.len() {
                    return Err(GrammarError::TerminalLhs {
                        name: lhs.to_string(),
                    });
                }
                continue;
            }
            let id = (terminals.len() + nonterminals.len()) as SymbolId;
            by_name.insert(lhs.to_string(), id);
            nonterminals.push(lhs.to_string());
        }

        // The augmented start symbol interns after everything else is known.
        let start_id = terminals.len() as SymbolId; // id of "S'"
        by_name.insert("S'".to_string(), start_id);

        // Second pass: productions.
        let mut productions = Vec::with_capacity(lines.len() + 1);
        let first_lhs = {
            let (lhs, _) = lines[0].split_once("->").expect("checked above");
            by_name[lhs.trim()]
        };
        productions.push(Production {
            lhs: start_id,
            rhs: vec![first_lhs],
            text: format!("S' -> {}", lines[0].split_once("->").expect("checked").0.trim()),
        });
        for (i, line) in lines.iter().enumerate() {
            let line_no = i + 1;
            let (lhs, rhs) = line.split_once("->").expect("checked above");
            let lhs_id = by_name[lhs.trim()];
            let mut rhs_ids = Vec::new();
            for name in rhs.split_whitespace() {
                if name == LAMBDA {
                    continue;
                }
                let id = by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| GrammarError::UnknownSymbol {
                        name: name.to_string(),
                        line: line_no,
                    })?;
                rhs_ids.push(id);
            }
            productions.push(Production {
                lhs: lhs_id,
                rhs: rhs_ids,
                text: (*line).to_string(),
            });
        }

        Ok(Self {
            terminals,
            nonterminals,
            by_name,
            productions,
        })
    }

    /// The built-in Boreal grammar.
    pub fn boreal() -> Result<Self, GrammarError> {
        Self::parse(TERMINALS, RULES)
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.terminals.len() + self.nonterminals.len()
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        (id as usize) < self.terminals.len()
    }

    /// Id of the end-of-input terminal.
    pub fn eof(&self) -> SymbolId {
        self.by_name["$"]
    }

    /// Id of the augmented start symbol.
    pub fn augmented_start(&self) -> SymbolId {
        self.terminals.len() as SymbolId
    }

    /// Id of the user start symbol (left-hand side of rule 1).
    pub fn start(&self) -> SymbolId {
        self.productions[0].rhs[0]
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        let id = id as usize;
        if id < self.terminals.len() {
            &self.terminals[id]
        } else {
            &self.nonterminals[id - self.terminals.len()]
        }
    }

    /// Index of a non-terminal into GOTO columns.
    pub fn nonterminal_index(&self, id: SymbolId) -> usize {
        id as usize - self.terminals.len()
    }

    /// Terminal names in column order.
    pub fn terminal_names(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(String::as_str)
    }

    /// Non-terminal names in column order, the augmented start excluded.
    pub fn nonterminal_names(&self) -> impl Iterator<Item = &str> {
        self.nonterminals.iter().skip(1).map(String::as_str)
    }
}
