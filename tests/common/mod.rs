#![allow(dead_code)]

use protocol_model::{ModelEngine, Program, Var};
use symbolic_oracle::{Alphabet, OracleConfig, QueryRunner, Symbol};

const READ: &str = "smtp_read_aux";
const WRITE: &str = "smtp_write";

pub fn initialize_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn alphabet() -> Alphabet {
    Alphabet::from_pairs([
        ("CONNECT", "CONNECT\n"),
        ("DATA", "DATA\n"),
        ("QUIT", "QUIT\n"),
        ("GARBAGE", "GARBAGE\n"),
        ("OK", "OK\n"),
        ("BYE", "BYE\n"),
        ("ERROR", "ERROR\n"),
    ])
    .expect("failed to build alphabet")
}

pub fn word(symbols: &[&str]) -> Vec<Symbol> {
    symbols.iter().copied().map(Symbol::from).collect()
}

pub fn symbols(symbols: &[&str]) -> Vec<Symbol> {
    word(symbols)
}

pub fn sorted(mut symbols: Vec<Symbol>) -> Vec<Symbol> {
    symbols.sort();
    symbols
}

pub fn runner(program: Program) -> QueryRunner<ModelEngine> {
    runner_with(ModelEngine::new(program), OracleConfig::default())
}

pub fn runner_with(engine: ModelEngine, config: OracleConfig) -> QueryRunner<ModelEngine> {
    QueryRunner::new(engine, config).expect("failed to create runner")
}

/// Greets a client after CONNECT, then answers DATA with OK and QUIT with BYE. Anything
/// unexpected closes the session.
pub fn session_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .send(WRITE, "OK\n")
        .label("command")
        .receive(READ)
        .matching([("DATA\n", "data"), ("QUIT\n", "quit")], "close")
        .label("data")
        .send(WRITE, "OK\n")
        .jump("command")
        .label("quit")
        .send(WRITE, "BYE\n")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build session server")
}

/// Answers CONNECT with either OK or ERROR depending on internal state.
pub fn nondeterministic_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .havoc(Var::new(0))
        .branch_eq(Var::new(0), 0, "refuse")
        .send(WRITE, "OK\n")
        .exit(0)
        .label("refuse")
        .send(WRITE, "ERROR\n")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build nondeterministic server")
}

/// Answers CONNECT with OK on two feasible paths. A third path requires state to be both 1 and
/// 2 and would answer ERROR if it ever ran.
pub fn contradicting_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .havoc(Var::new(0))
        .branch_eq(Var::new(0), 1, "one")
        .send(WRITE, "OK\n")
        .exit(0)
        .label("one")
        .branch_eq(Var::new(0), 2, "impossible")
        .send(WRITE, "OK\n")
        .exit(0)
        .label("impossible")
        .send(WRITE, "ERROR\n")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build contradicting server")
}

/// Answers CONNECT with OK on one path and with ERROR split across two writes on another.
pub fn staggered_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .havoc(Var::new(0))
        .branch_eq(Var::new(0), 0, "slow")
        .send(WRITE, "OK\n")
        .exit(0)
        .label("slow")
        .send(WRITE, "ERR")
        .send(WRITE, "OR\n")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build staggered server")
}

/// Exits halfway through writing its reply to CONNECT.
pub fn truncating_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .send(WRITE, "ERR")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build truncating server")
}

/// Replies to CONNECT with OK followed directly by BYE, in one write or split after `OK`.
pub fn overrunning_server(split: bool) -> Program {
    let builder = Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet");
    let builder = if split {
        builder.send(WRITE, "OK").send(WRITE, "\nBYE\n")
    } else {
        builder.send(WRITE, "OK\nBYE\n")
    };

    builder
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build overrunning server")
}

/// Greets after CONNECT and exits without replying once QUIT is read.
pub fn abrupt_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .send(WRITE, "OK\n")
        .receive(READ)
        .matching([("QUIT\n", "quit")], "close")
        .label("quit")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build abrupt server")
}

/// Writes nothing in reply to CONNECT and exits.
pub fn silent_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .send(WRITE, "")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build silent server")
}

/// Replies with bytes that are not the encoding of any symbol.
pub fn garbled_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "greet")], "close")
        .label("greet")
        .send(WRITE, "???\n")
        .exit(0)
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build garbled server")
}

/// Spins forever after CONNECT without reading again.
pub fn spinning_server() -> Program {
    Program::builder()
        .receive(READ)
        .matching([("CONNECT\n", "spin")], "close")
        .label("spin")
        .jump("spin")
        .label("close")
        .exit(1)
        .build()
        .expect("failed to build spinning server")
}

/// Forks on every iteration before reading anything.
pub fn forking_server() -> Program {
    Program::builder()
        .label("top")
        .havoc(Var::new(0))
        .branch_eq(Var::new(0), 0, "top")
        .jump("top")
        .build()
        .expect("failed to build forking server")
}
