use std::collections::HashMap;

use lisby_core::Symbol;

/// Arena index for an [`Environment`] frame.
///
/// Closures and continuations both need to hold onto environments that may
/// outlive the call that created them, and the chain can become cyclic
/// once a closure stored in an environment also captures that same
/// environment. An arena of frames addressed by index sidesteps having to
/// reason about `Rc`/`Weak` cycles for that graph: every frame lives as
/// long as the VM does, and references are plain `Copy` indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EnvId(u32);

/// A single lexical frame: bindings introduced at this scope, plus a link
/// to the enclosing frame.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub values: HashMap<Symbol, Option<crate::value::Value>>,
    pub parent: Option<EnvId>,
}

/// A captured return point: resume tape/pc under the given environment.
/// Stored in the VM's return stack and snapshotted whole into a
/// [`crate::value::Value::Continuation`].
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub tape: usize,
    pub pc: usize,
    pub env: EnvId,
}

/// Owns every [`Environment`] frame ever created during a VM run.
#[derive(Debug, Clone, Default)]
pub struct EnvArena {
    envs: Vec<Environment>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self { envs: Vec::new() }
    }

    /// Creates the root environment, with no parent. Persists across REPL
    /// turns as the VM's `topenv`.
    pub fn new_root(&mut self) -> EnvId {
        self.push(Environment {
            values: HashMap::new(),
            parent: None,
        })
    }

    pub fn new_child(&mut self, parent: EnvId) -> EnvId {
        self.push(Environment {
            values: HashMap::new(),
            parent: Some(parent),
        })
    }

    fn push(&mut self, env: Environment) -> EnvId {
        let id = EnvId(self.envs.len() as u32);
        self.envs.push(env);
        id
    }

    pub fn get(&self, id: EnvId) -> &Environment {
        &self.envs[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut Environment {
        &mut self.envs[id.0 as usize]
    }

    /// Declares `sym` as an uninitialized binding in `id`'s own frame.
    pub fn declare(&mut self, id: EnvId, sym: Symbol) {
        self.get_mut(id).values.insert(sym, None);
    }

    /// Walks the parent chain from `id` looking for a frame that already
    /// has an entry (declared or stored) for `sym`.
    pub fn find_owner(&self, id: EnvId, sym: Symbol) -> Option<EnvId> {
        let mut cur = Some(id);
        while let Some(env_id) = cur {
            let env = self.get(env_id);
            if env.values.contains_key(&sym) {
                return Some(env_id);
            }
            cur = env.parent;
        }
        None
    }

    pub fn id_ordinal(id: EnvId) -> u32 {
        id.0
    }
}
