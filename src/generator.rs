/*
generator.rs

Copyright 2025 Hervé Quatremain

This file is part of Fogdag.

Fogdag is free software: you can redistribute it and/or modify it under the
terms of the GNU General Public License as published by the Free Software
Foundation, either version 3 of the License, or (at your option) any later
version.

Fogdag is distributed in the hope that it will be useful, but WITHOUT ANY
WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
A PARTICULAR PURPOSE. See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License along with
Fogdag. If not, see <https://www.gnu.org/licenses/>.

SPDX-License-Identifier: GPL-3.0-or-later
*/

//! Generate random route graphs between fog gate clusters.
//!
//! A [`cluster::ClusterPool`] object lists the clusters that can be placed in a graph.
//! Each cluster has entry and exit fog gates, and the [`compat`] module decides, from these fog
//! gates, whether a cluster can continue a branch, split it, or merge several branches.
//!
//! A generation attempt goes through three stages:
//!
//! * A [`planner::LayerPlan`] object gives the preferred cluster type and the tier of each layer.
//! * A [`builder::Generator`] object grows the graph layer by layer from the start cluster, and
//!   then merges the remaining branches into a final boss.
//!   The result is a [`dag::Dag`] object.
//! * The [`validator::validate`] function verifies the finished graph.
//!   It relies on the [`balance`] module to compare the weights of the paths.
//!
//! The [`retry::generate`] function runs attempts with new seeds until one succeeds, and
//! [`spoiler::render`] describes the result in plain text.

pub mod balance;
pub mod builder;
pub mod cluster;
pub mod compat;
pub mod dag;
pub mod planner;
pub mod retry;
pub mod spoiler;
pub mod validator;
