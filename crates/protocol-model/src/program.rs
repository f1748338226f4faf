use std::collections::BTreeMap;
use std::fmt::Display;

use crate::engine::{Error, Result};

/// A symbolic byte of target state that is not determined by protocol input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

impl Var {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Instructions of a protocol target model. Branch targets are label names resolved when the
/// program is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    /// Call the named routine to read the next message. The bytes read replace the input buffer.
    Receive { routine: String },

    /// Call the named routine to write `data`
    Send { routine: String, data: Vec<u8> },

    /// Jump to the label of the first arm whose bytes equal the input buffer, otherwise to
    /// `otherwise`.
    Match {
        arms: Vec<(Vec<u8>, String)>,
        otherwise: String,
    },

    /// Forget everything known about `var`
    Havoc { var: Var },

    /// Fork on `var == value`. The path jumps to `target` when equal and falls through otherwise.
    BranchEq { var: Var, value: u8, target: String },

    Jump(String),

    /// Terminate the target with an exit code
    Exit(i32),
}

/// A target model with resolved labels.
#[derive(Clone, Debug)]
pub struct Program {
    instrs: Vec<Instr>,
    labels: BTreeMap<String, usize>,
}

impl Program {
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn instruction(&self, index: usize) -> Option<&Instr> {
        self.instrs.get(index)
    }

    /// Index of the instruction following the label
    pub fn resolve(&self, label: &str) -> Result<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::UndefinedLabel(label.to_owned()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    instrs: Vec<Instr>,
    labels: BTreeMap<String, usize>,
}

impl ProgramBuilder {
    /// Label the next instruction.
    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.labels.insert(name.into(), self.instrs.len());
        self
    }

    pub fn receive(self, routine: impl Into<String>) -> Self {
        self.push(Instr::Receive {
            routine: routine.into(),
        })
    }

    pub fn send(self, routine: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(Instr::Send {
            routine: routine.into(),
            data: data.into(),
        })
    }

    pub fn matching<B, L>(
        self,
        arms: impl IntoIterator<Item = (B, L)>,
        otherwise: impl Into<String>,
    ) -> Self
    where
        B: Into<Vec<u8>>,
        L: Into<String>,
    {
        self.push(Instr::Match {
            arms: arms
                .into_iter()
                .map(|(bytes, label)| (bytes.into(), label.into()))
                .collect(),
            otherwise: otherwise.into(),
        })
    }

    pub fn havoc(self, var: Var) -> Self {
        self.push(Instr::Havoc { var })
    }

    pub fn branch_eq(self, var: Var, value: u8, target: impl Into<String>) -> Self {
        self.push(Instr::BranchEq {
            var,
            value,
            target: target.into(),
        })
    }

    pub fn jump(self, target: impl Into<String>) -> Self {
        self.push(Instr::Jump(target.into()))
    }

    pub fn exit(self, code: i32) -> Self {
        self.push(Instr::Exit(code))
    }

    /// Confirm every referenced label is defined.
    pub fn build(self) -> Result<Program> {
        let program = Program {
            instrs: self.instrs,
            labels: self.labels,
        };

        for instr in &program.instrs {
            match instr {
                Instr::Match { arms, otherwise } => {
                    for (_, label) in arms {
                        program.resolve(label)?;
                    }
                    program.resolve(otherwise)?;
                }
                Instr::BranchEq { target, .. } | Instr::Jump(target) => {
                    program.resolve(target)?;
                }
                Instr::Receive { .. }
                | Instr::Send { .. }
                | Instr::Havoc { .. }
                | Instr::Exit(_) => {}
            }
        }

        Ok(program)
    }

    fn push(mut self, instr: Instr) -> Self {
        self.instrs.push(instr);
        self
    }
}
