// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for content caching and bundle updates


mod coordinator_tests;
#[cfg(feature = "http")]
mod fetcher_tests;
