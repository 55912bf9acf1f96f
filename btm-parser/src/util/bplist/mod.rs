/*!
 Contains logic and data structures used to read the binary property list container that BTM files are stored in.

 ## Overview

 A `bplist00` file is a flat pool of objects addressed through an offset table. Containers
 (arrays, sets and dictionaries) do not hold their children inline; they hold indices into
 the pool. [`parser::BinaryPlistReader`] decodes one object at a time, so callers decide
 which parts of the pool are ever touched.

 ## Features

 - Pure Rust implementation with no dependencies on Apple frameworks
 - Bounds-checked reads; malformed input produces an [`ArchiveError`](crate::error::archive::ArchiveError)
*/

pub mod models;
pub mod parser;
