//! Recursive descent over container atoms.
//!
//! Children are dispatched through an ordered list of `(tag, parser)`
//! pairs. The first matching entry wins, since malformed files may
//! contain duplicate tags. Unknown children are either captured as
//! `RawAtom` or skipped.

use crate::{atom::{Atom, RawAtom}, consts::HEADER_LENGTH, ByteStream, ContainerError, FourCC};

/// Parses one child atom into its parent structure.
/// The stream is positioned directly after the child's header.
pub type ParseFn<T> = fn(&mut ByteStream, &mut T, &Atom) -> Result<(), ContainerError>;

/// Stores an unknown child atom in its parent structure.
pub type CaptureFn<T> = fn(&mut T, RawAtom);

/// Walks the children of `parent`, starting at the current position
/// (directly after the parent header or its fixed fields),
/// until the parent's end is reached.
pub fn walk<T>(
    stream: &mut ByteStream,
    parent: &Atom,
    target: &mut T,
    handlers: &[(FourCC, ParseFn<T>)],
    capture: Option<CaptureFn<T>>,
) -> Result<(), ContainerError> {
    let mut last: Option<Atom> = None;

    while stream.position() < parent.end {
        let pos = stream.position();
        if parent.end - pos < HEADER_LENGTH {
            stream.log.warn(format_args!(
                "'{}' @ {}: ignoring {} trailing bytes",
                parent.tag, parent.start, parent.end - pos
            ));
            stream.seek_to(parent.end)?;
            last = None;
            break
        }

        let Some(mut child) = Atom::read_header_within(stream, parent.end)? else {
            // 'wide' placeholder closing the parent
            stream.seek_to(parent.end)?;
            last = None;
            break
        };
        if child.end > parent.end {
            stream.log.warn(format_args!(
                "'{}' @ {} extends {} bytes beyond parent '{}', clamping",
                child.tag, child.start, child.end - parent.end, parent.tag
            ));
            child.end = parent.end;
            child.size = child.end - child.start;
        }

        match handlers.iter().find(|(tag, _)| *tag == child.tag) {
            Some((_, parse)) => parse(stream, target, &child)?,
            None => match capture {
                Some(store) if stream.capture_unknown => {
                    let raw = RawAtom::read(stream, &child)?;
                    store(target, raw);
                },
                _ => stream.log.trace(format_args!(
                    "skipping '{}' @ {} in '{}'", child.tag, child.start, parent.tag
                )),
            },
        }

        child.skip(stream)?;
        last = Some(child);
    }

    if let Some(child) = last {
        child.skip(stream)?;
    }

    Ok(())
}
