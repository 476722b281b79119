//! Audio parameter output.
//!
//! Scanners push their smoothed estimates into a [`ParameterSink`], which
//! stands in for the host mixer's parameter API (global parameters and
//! per-event-instance parameters).

use crate::error::{Result, SonoProbeError};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle of an audio event instance in the host mixer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

/// Where a parameter value goes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterTarget {
    Global,
    Instance(InstanceId),
}

/// Receiver of continuous audio parameters.
pub trait ParameterSink {
    fn set_global_parameter(&mut self, name: &str, value: f32) -> Result<()>;

    fn set_instance_parameter(&mut self, instance: InstanceId, name: &str, value: f32) -> Result<()>;

    fn set_parameter(&mut self, target: ParameterTarget, name: &str, value: f32) -> Result<()> {
        match target {
            ParameterTarget::Global => self.set_global_parameter(name, value),
            ParameterTarget::Instance(instance) => self.set_instance_parameter(instance, name, value),
        }
    }
}

impl<T: ParameterSink + ?Sized> ParameterSink for &mut T {
    fn set_global_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        (**self).set_global_parameter(name, value)
    }

    fn set_instance_parameter(&mut self, instance: InstanceId, name: &str, value: f32) -> Result<()> {
        (**self).set_instance_parameter(instance, name, value)
    }
}

/// A single parameter write, as sent over a channel
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCommand {
    pub target: ParameterTarget,
    pub name: Arc<str>,
    pub value: f32,
}

/// Sink forwarding every write to another thread (typically the audio thread).
#[derive(Debug, Clone)]
pub struct ChannelParameterSink {
    sender: Sender<ParameterCommand>,
}

impl ChannelParameterSink {
    pub fn new(sender: Sender<ParameterCommand>) -> Self {
        Self { sender }
    }

    /// Creates a sink together with the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<ParameterCommand>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    fn send(&self, target: ParameterTarget, name: &str, value: f32) -> Result<()> {
        self.sender
            .send(ParameterCommand {
                target,
                name: Arc::from(name),
                value,
            })
            .map_err(|e| {
                SonoProbeError::ParameterSink(format!("Failed to send parameter {}: {}", name, e))
            })
    }
}

impl ParameterSink for ChannelParameterSink {
    fn set_global_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        self.send(ParameterTarget::Global, name, value)
    }

    fn set_instance_parameter(&mut self, instance: InstanceId, name: &str, value: f32) -> Result<()> {
        self.send(ParameterTarget::Instance(instance), name, value)
    }
}

/// In-memory sink keeping the latest value of every parameter.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    values: HashMap<(ParameterTarget, String), f32>,
    writes: usize,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: ParameterTarget, name: &str) -> Option<f32> {
        self.values.get(&(target, name.to_string())).copied()
    }

    pub fn global(&self, name: &str) -> Option<f32> {
        self.get(ParameterTarget::Global, name)
    }

    pub fn instance(&self, instance: InstanceId, name: &str) -> Option<f32> {
        self.get(ParameterTarget::Instance(instance), name)
    }

    /// Applies a command received from a [`ChannelParameterSink`].
    pub fn apply(&mut self, command: &ParameterCommand) {
        self.insert(command.target, &command.name, command.value);
    }

    /// Total number of writes seen, including overwrites
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, target: ParameterTarget, name: &str, value: f32) {
        self.values.insert((target, name.to_string()), value);
        self.writes += 1;
    }
}

impl ParameterSink for ParameterStore {
    fn set_global_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        self.insert(ParameterTarget::Global, name, value);
        Ok(())
    }

    fn set_instance_parameter(&mut self, instance: InstanceId, name: &str, value: f32) -> Result<()> {
        self.insert(ParameterTarget::Instance(instance), name, value);
        Ok(())
    }
}
