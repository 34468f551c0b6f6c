//! Per-thread interpreter context handed to every method call.

use std::fmt;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::interpreter::object::Object;
use crate::interpreter::vm::Vm;

type BlockBody = dyn Fn(&mut Thread, &[Object]) -> Object + Send + Sync;

/// A caller-supplied block that block-taking builtins (`each`, `map`, ...)
/// yield to.
#[derive(Clone)]
pub struct BlockFrame {
    source_line: usize,
    body: Arc<BlockBody>,
}

impl BlockFrame {
    pub fn new<F>(source_line: usize, body: F) -> Self
    where
        F: Fn(&mut Thread, &[Object]) -> Object + Send + Sync + 'static,
    {
        Self {
            source_line,
            body: Arc::new(body),
        }
    }

    pub fn source_line(&self) -> usize {
        self.source_line
    }
}

impl fmt::Debug for BlockFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockFrame(line {})", self.source_line)
    }
}

/// The state one interpreter thread carries. A `Thread` belongs to exactly
/// one OS thread; the `Vm` behind it is shared.
pub struct Thread {
    id: usize,
    vm: Arc<Vm>,
    block_frames: Vec<BlockFrame>,
}

impl Thread {
    pub(crate) fn new(id: usize, vm: Arc<Vm>) -> Self {
        Self {
            id,
            vm,
            block_frames: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn vm(&self) -> &Arc<Vm> {
        &self.vm
    }

    pub fn push_block_frame(&mut self, frame: BlockFrame) {
        self.block_frames.push(frame);
    }

    pub fn pop_block_frame(&mut self) -> Option<BlockFrame> {
        self.block_frames.pop()
    }

    pub fn block_depth(&self) -> usize {
        self.block_frames.len()
    }

    /// Run `block` with `args`, keeping its frame on the stack for the
    /// duration of the call.
    pub fn builtin_method_yield(&mut self, block: &BlockFrame, args: &[Object]) -> Object {
        self.push_block_frame(block.clone());
        let result = (block.body)(self, args);
        self.pop_block_frame();
        result
    }

    /// Build an error object of `kind`.
    pub fn error(&self, kind: ErrorKind, source_line: usize, message: impl Into<String>) -> Object {
        self.vm.init_error_object(kind, source_line, message)
    }

    /// Resolve `name` on `receiver` and call it.
    ///
    /// Falls back to a method_missing hook, which receives the missing name
    /// as its first argument, and finally to a NoMethodError object.
    pub fn send(
        &mut self,
        receiver: &Object,
        name: &str,
        source_line: usize,
        args: &[Object],
        block: Option<&BlockFrame>,
    ) -> Object {
        if let Some(method) = receiver.find_method(name) {
            return method.call(receiver, source_line, self, args, block);
        }

        if let Some(hook) = receiver.find_method_missing(true) {
            if self.vm.config().trace_dispatch {
                log::debug!(
                    "dispatching '{}' on {} to method_missing",
                    name,
                    receiver.class().name()
                );
            }
            let mut hook_args = Vec::with_capacity(args.len() + 1);
            hook_args.push(Object::string(name));
            hook_args.extend_from_slice(args);
            return hook.call(receiver, source_line, self, &hook_args, block);
        }

        self.vm.init_no_method_error(source_line, name, receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yield_pushes_and_pops_frame() {
        let vm = Vm::with_defaults();
        let mut thread = vm.new_thread();
        let block = BlockFrame::new(3, |t, args| {
            assert_eq!(t.block_depth(), 1);
            args[0].clone()
        });

        let result = thread.builtin_method_yield(&block, &[Object::integer(5)]);
        assert!(result.equal_to(&Object::integer(5)));
        assert_eq!(thread.block_depth(), 0);
        assert_eq!(block.source_line(), 3);
    }

    #[test]
    fn test_threads_get_distinct_ids() {
        let vm = Vm::with_defaults();
        let a = vm.new_thread();
        let b = vm.new_thread();
        assert_ne!(a.id(), b.id());
    }
}
