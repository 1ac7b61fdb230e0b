// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! External MIDI receiver via midir.
//!
//! This module provides a midir implementation of the `NoteSink` trait,
//! sending note messages to a hardware or virtual MIDI port.

use anyhow::{anyhow, Result};
use midir::{MidiOutput, MidiOutputConnection};

use crate::music::MidiNote;

use super::{messages, NoteSink, OutputError};

const CLIENT_NAME: &str = "chordpad";

/// midir output connected to one port
pub struct MidirSink {
    connection: MidiOutputConnection,
    port_name: String,
    channel: u8,
}

impl MidirSink {
    /// Connect to a port by index or by (partial, case-insensitive) name.
    ///
    /// # Arguments
    /// * `port` - Port index as listed by `list_midi_outputs`, or part of its name
    /// * `channel` - MIDI channel 0-15
    pub fn connect(port: &str, channel: u8) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(anyhow!("No MIDI output ports available"));
        }

        let index = match port.parse::<usize>() {
            Ok(index) => index,
            Err(_) => ports
                .iter()
                .position(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.to_lowercase().contains(&port.to_lowercase()))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("No MIDI output matching '{}' found", port))?,
        };

        let selected = ports.get(index).ok_or_else(|| {
            anyhow!(
                "MIDI output {} not found (only {} available)",
                index,
                ports.len()
            )
        })?;

        let port_name = midi_out
            .port_name(selected)
            .unwrap_or_else(|_| format!("port {}", index));

        let connection = midi_out
            .connect(selected, "chordpad-out")
            .map_err(|e| anyhow!("Failed to connect to MIDI output '{}': {}", port_name, e))?;

        tracing::info!("Connected to MIDI output '{}' (channel {})", port_name, channel + 1);

        Ok(Self {
            connection,
            port_name,
            channel: channel & 0x0F,
        })
    }

    fn send(&mut self, message: &[u8]) -> Result<(), OutputError> {
        self.connection
            .send(message)
            .map_err(|e| OutputError::SendFailed(format!("{}: {}", self.port_name, e)))
    }
}

impl NoteSink for MidirSink {
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<(), OutputError> {
        let message = messages::note_on_bytes(self.channel, note, velocity);
        self.send(&message)
    }

    fn note_off(&mut self, note: MidiNote) -> Result<(), OutputError> {
        let message = messages::note_off_bytes(self.channel, note);
        self.send(&message)
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// List available MIDI outputs as `(index, name)` pairs
pub fn list_midi_outputs() -> Result<Vec<(usize, String)>> {
    let midi_out = MidiOutput::new(CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

    Ok(midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(i, p)| midi_out.port_name(p).ok().map(|name| (i, name)))
        .collect())
}

/// Print available MIDI outputs to stdout
pub fn print_midi_outputs() -> Result<()> {
    let outputs = list_midi_outputs()?;
    println!("MIDI Outputs:");
    if outputs.is_empty() {
        println!("  (none)");
    }
    for (index, name) in outputs {
        println!("  {}: {}", index, name);
    }
    Ok(())
}
