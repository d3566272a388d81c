#![allow(missing_docs)]
//! This module contains the internals of the compiler.
//!
//! Compilation happens in two layers: the [`scanner`] splits template text
//! into text and tags and builds the node tree, while the [`lexer`] and
//! [`parser`] handle the expressions inside of variable and conditional
//! tags.
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod tokens;
