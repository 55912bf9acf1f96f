/*!
 Contains logic and data structures used to rebuild the object graph stored in a BTM file.

 ## Overview

 BTM files are written by `NSKeyedArchiver`: objects live in an `$objects` table and refer
 to each other by `UID`. [`resolver::KeyedArchiveResolver`] follows those references and
 produces a tree of [`models::ArchivedObject`] nodes.

 Only the classes a BTM store is made of are decoded. Any other `$classname` fails the
 whole decode with [`KeyedArchiveError::UnexpectedClass`](crate::error::keyed_archive::KeyedArchiveError::UnexpectedClass).
*/

pub mod models;
pub mod resolver;
