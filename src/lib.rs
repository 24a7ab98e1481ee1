//! An OpenID Connect 1.0 / OAuth 2.0 authorization server engine.
//!
//! This crate implements the request-validation and token-lifecycle core of
//! an authorization server: the staged authorization pipeline
//! (fetch → validate → process) built from composable validators, the token
//! services issuing and rotating `at+jwt` / `id+jwt` / `rt+jwt` /
//! `logout+jwt` tokens, and the end-session pipeline with concurrent
//! back-/front-channel logout notification.
//!
//! HTTP transport, client registration storage, persistent key material and
//! the end-user authentication UI are the embedding application's concern;
//! they plug in through the traits in [`providers`], [`storage`] and
//! [`jwt`].

pub mod authorize;
pub mod config;
pub mod end_session;
pub mod error;
pub mod jwt;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validators;

pub use config::Config;
