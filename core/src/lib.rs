#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod book;
pub mod busy;
pub mod contents;
pub mod editor;
pub mod flip;
pub mod layout;
pub mod lock;
pub mod navigation;
pub mod recipe;
pub mod repository;
pub mod scheme;
pub mod store;

#[cfg(test)]
mod testing;
