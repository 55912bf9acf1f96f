/*!
 Maps the decoded object graph onto the domain types stored in a BTM file.

 - [`store::Store`]: the top-level `Storage` object
 - [`item::ItemRecord`]: one background item
 - [`flags`]: descriptions of the `type` and `disposition` bitmasks
 - [`hierarchy`]: parent lookup through the `container` field
 - [`executable`]: executable resolution for login items and apps
*/

pub mod executable;
pub mod fields;
pub mod flags;
pub mod hierarchy;
pub mod item;
pub mod store;
