// SPDX-License-Identifier: MIT

pub mod sources;
