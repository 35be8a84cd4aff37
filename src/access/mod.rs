// Copyright (c) 2025 - Cowboy AI, Inc.
//! Access Control: roles, grants and secret propagation

pub mod policy;
pub mod secret;

pub use policy::{ExecutionRole, Grant, GrantId, PolicyError, Principal};
pub use secret::{
    ParameterPointer, SecretHandle, SecretIdentity, PARAMETER_READ_ACTIONS, SECRET_READ_ACTIONS,
};
