/*!
 Errors that can happen while decoding a BTM store.
*/

pub mod archive;
pub mod btm;
pub mod bundle;
pub mod diagnostic;
pub mod keyed_archive;
pub mod record;
