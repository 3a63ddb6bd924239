// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod kernel;
pub mod request;

pub use factory::LocalRequestFactory;
pub use kernel::Kernel;
pub use request::LocalRequest;
