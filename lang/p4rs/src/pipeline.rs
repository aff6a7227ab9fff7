// Copyright 2024 Oxide Computer Company

//! Cycle stepped model of a generated table pipeline module.
//!
//! A request moves through three stages. The request stage packs the key
//! and looks it up, the execute stage decodes the action tag and forwards
//! the call onto that action's channel, and the response stage drains one
//! channel per cycle as chosen by the arbiter. Stages are evaluated back to
//! front so a request advances at most one stage per cycle.

use std::collections::VecDeque;

use slog::{debug, trace, warn, Logger};

use crate::arbiter;
use crate::bits::{self, Bits};
use crate::error::EncodeError;
use crate::table::SharedMatchTable;
use crate::{ActionCall, TableShape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Opaque packet handle carried alongside the lookup.
    pub packet: u64,
    pub key: Vec<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub packet: u64,
    pub channel: usize,
    pub call: ActionCall,
    pub cycle: u64,
}

pub struct TablePipeline<'a> {
    shape: &'a TableShape,
    table: &'a SharedMatchTable,
    depth: usize,
    requests: VecDeque<(u64, Bits)>,
    lookups: VecDeque<(u64, Bits)>,
    channels: Vec<VecDeque<(u64, ActionCall)>>,
    completed: Vec<Completion>,
    cycle: u64,
    dropped: usize,
    log: Logger,
}

impl<'a> TablePipeline<'a> {
    /// `depth` bounds every internal queue, like the FIFOs of the generated
    /// module.
    pub fn new(
        shape: &'a TableShape,
        table: &'a SharedMatchTable,
        depth: usize,
        log: Logger,
    ) -> Self {
        let log = log.new(slog::o!("table" => shape.name));
        Self {
            shape,
            table,
            depth: depth.max(1),
            requests: VecDeque::new(),
            lookups: VecDeque::new(),
            channels: (0..shape.actions.len()).map(|_| VecDeque::new()).collect(),
            completed: Vec::new(),
            cycle: 0,
            dropped: 0,
            log,
        }
    }

    /// Admit a request. The key is packed immediately so malformed requests
    /// are rejected before they enter the pipeline.
    pub fn submit(&mut self, request: Request) -> Result<(), EncodeError> {
        let key = self.shape.encode_request(&request.key)?;
        self.requests.push_back((request.packet, key));
        Ok(())
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Responses whose tag named no action. Only possible when an entry was
    /// written with a raw tag outside the action list.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_idle(&self) -> bool {
        self.requests.is_empty()
            && self.lookups.is_empty()
            && self.channels.iter().all(|c| c.is_empty())
    }

    /// Advance one cycle.
    pub fn step(&mut self) {
        self.handle_response();
        self.execute();
        self.handle_request();
        self.cycle += 1;
    }

    /// Step until every admitted request completed or `max_cycles` elapsed,
    /// then hand back the completions in the order they left the pipeline.
    pub fn run(&mut self, max_cycles: u64) -> Vec<Completion> {
        let start = self.cycle;
        while !self.is_idle() && self.cycle - start < max_cycles {
            self.step();
        }
        debug!(self.log, "pipeline run";
            "cycles" => self.cycle - start,
            "completed" => self.completed.len(),
            "idle" => self.is_idle()
        );
        std::mem::take(&mut self.completed)
    }

    fn handle_request(&mut self) {
        if self.lookups.len() >= self.depth {
            return;
        }
        let Some((packet, key)) = self.requests.pop_front() else {
            return;
        };
        let response = match self.table.read(&key) {
            Ok(rsp) => rsp,
            Err(e) => {
                warn!(self.log, "lookup failed"; "error" => %e);
                bits::zeros(self.shape.response_width())
            }
        };
        trace!(self.log, "lookup";
            "packet" => packet,
            "key" => bits::dump(&key),
            "response" => bits::dump(&response)
        );
        self.lookups.push_back((packet, response));
    }

    fn execute(&mut self) {
        let tag = match self.lookups.front() {
            Some((_, rsp)) => match self.shape.decode_response(rsp) {
                Ok(call) => call.tag,
                Err(_) => usize::MAX,
            },
            None => return,
        };
        if tag < self.channels.len() && self.channels[tag].len() >= self.depth
        {
            return;
        }
        let Some((packet, rsp)) = self.lookups.pop_front() else {
            return;
        };
        match self.shape.decode_response(&rsp) {
            Ok(call) => {
                trace!(self.log, "dispatch";
                    "packet" => packet,
                    "action" => call.action
                );
                self.channels[call.tag].push_back((packet, call));
            }
            Err(e) => {
                warn!(self.log, "response dropped"; "error" => %e);
                self.dropped += 1;
            }
        }
    }

    fn handle_response(&mut self) {
        let ready: Vec<bool> =
            self.channels.iter().map(|c| !c.is_empty()).collect();
        let channel = arbiter::select(&ready);
        if channel >= self.channels.len() {
            return;
        }
        if let Some((packet, call)) = self.channels[channel].pop_front() {
            trace!(self.log, "complete";
                "packet" => packet,
                "channel" => channel
            );
            self.completed.push(Completion {
                packet,
                channel,
                call,
                cycle: self.cycle,
            });
        }
    }
}
