use crate::error::Result;
use crate::indexer::ast::{Call, Node};
use crate::indexer::emitter::FactEmitter;

/// Name of the called function: a bare identifier, or the trailing
/// attribute of `receiver.attr(...)`. The receiver is not looked at.
pub fn callee_name(call: &Call) -> Option<&str> {
    match call.func.as_ref() {
        Node::Name(name) => Some(name.id.as_str()),
        Node::Attribute(attribute) => Some(attribute.attr.as_str()),
        _ => None,
    }
}

/// Records an unresolved call fact. Resolving it to a target is left to
/// whoever consumes the stream.
pub(crate) fn record_call(
    emitter: &mut FactEmitter<'_>,
    call: &Call,
    file: &str,
    module_id: &str,
) -> Result<()> {
    match callee_name(call) {
        Some(name) if !name.is_empty() => emitter.call(name, file, module_id),
        _ => Ok(()),
    }
}
