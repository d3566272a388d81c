use std::fmt;

use crate::error::ErrorKind;
use crate::value::Value;

/// One level of the context chain.
pub(crate) struct Frame {
    pub(crate) value: Value,
    /// Position of the value when the frame was pushed by a sequence
    /// section.
    pub(crate) index: Option<usize>,
}

impl Frame {
    pub fn new(value: Value) -> Frame {
        Frame { value, index: None }
    }

    pub fn new_item(value: Value, index: usize) -> Frame {
        Frame {
            value,
            index: Some(index),
        }
    }

    /// Resolves a name against this frame alone.
    fn load(&self, key: &str) -> Option<Value> {
        if key == "." {
            return Some(self.value.clone());
        }

        if let Some(idx) = self.index {
            match key {
                ".index" => return Some(Value::from(idx)),
                ".index1" => return Some(Value::from(idx + 1)),
                _ => {}
            }
        }

        match self.value.call_method(key) {
            Ok(rv) => return Some(rv),
            Err(err) if err.kind() == ErrorKind::UnknownMethod => {}
            Err(_err) => {
                debug!(name = key, error = %_err, "method failed, resolving to none");
                return Some(Value::NONE);
            }
        }

        self.value.get_field(key)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_struct("Frame");
        m.field("value", &self.value);
        if let Some(idx) = self.index {
            m.field("index", &idx);
        }
        m.finish()
    }
}

/// The context chain a template renders against.
///
/// The innermost frame sits at the end of the stack.
#[derive(Default)]
pub(crate) struct Context {
    stack: Vec<Frame>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stack.iter().rev()).finish()
    }
}

impl Context {
    /// Creates a context from a chain where the first value is the
    /// innermost frame.
    pub fn new(chain: &[Value]) -> Context {
        Context {
            stack: chain.iter().rev().cloned().map(Frame::new).collect(),
        }
    }

    /// Looks up a name, searching from the innermost to the outermost frame.
    pub fn load(&self, key: &str) -> Option<Value> {
        self.stack.iter().rev().find_map(|frame| frame.load(key))
    }

    /// Pushes a new innermost frame.
    pub fn push_frame(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    /// Pops the innermost frame.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;

    #[test]
    fn test_innermost_wins() {
        let ctx = Context::new(&[
            context! { name => "inner" },
            context! { name => "outer", other => 42 },
        ]);
        assert_eq!(ctx.load("name"), Some(Value::from("inner")));
        assert_eq!(ctx.load("other"), Some(Value::from(42)));
        assert_eq!(ctx.load("missing"), None);
    }

    #[test]
    fn test_loop_index() {
        let mut ctx = Context::new(&[context! { x => 1 }]);
        assert_eq!(ctx.load(".index"), None);
        ctx.push_frame(Frame::new_item(Value::from("a"), 2));
        assert_eq!(ctx.load("."), Some(Value::from("a")));
        assert_eq!(ctx.load(".index"), Some(Value::from(2)));
        assert_eq!(ctx.load(".index1"), Some(Value::from(3)));
        assert_eq!(ctx.load("x"), Some(Value::from(1)));
        assert_eq!(ctx.depth(), 2);
        ctx.pop_frame();
        assert_eq!(ctx.load("."), Some(context! { x => 1 }));
    }

    #[test]
    fn test_scalar_frames_fall_through() {
        let ctx = Context::new(&[Value::from(true), context! { a => "b" }]);
        assert_eq!(ctx.load("a"), Some(Value::from("b")));
        assert_eq!(ctx.load("."), Some(Value::from(true)));
    }
}
