use crate::node::NodeRef;

/// Bindings visible to a running expression: the query root (`$`) and,
/// inside filters and scripts, the current node (`@`).
#[derive(Clone)]
pub(crate) struct Context<'a> {
    pub root: NodeRef<'a>,
    pub current: Option<NodeRef<'a>>,
}

impl<'a> Context<'a> {
    pub fn rooted(root: NodeRef<'a>) -> Self {
        Self {
            root,
            current: None,
        }
    }

    pub fn with_current(root: NodeRef<'a>, current: NodeRef<'a>) -> Self {
        Self {
            root,
            current: Some(current),
        }
    }
}
