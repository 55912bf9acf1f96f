/*!
 This module defines the readers and helpers used to decode BTM files.
*/

pub mod bplist;
pub mod bundle;
pub mod dates;
pub mod keyed_archive;
pub mod location;
