//! In-memory identity directory for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{AgentId, ChannelName, TeamId},
    ports::{IdentityDirectory, IdentityError, IdentityResult},
};

/// Thread-safe in-memory identity directory.
///
/// Messaging capability follows team ownership: an agent may always message
/// itself, and a team owner may message any member of a team it owns.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    tokens: HashMap<(AgentId, ChannelName), Vec<String>>,
    teams: HashMap<TeamId, TeamRecord>,
}

#[derive(Debug)]
struct TeamRecord {
    owner: AgentId,
    members: Vec<AgentId>,
}

fn lock_error(err: impl ToString) -> IdentityError {
    IdentityError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryIdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a team owned by `owner`. The owner is a member.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Persistence`] when lock acquisition fails.
    pub fn create_team(&self, team: TeamId, owner: AgentId) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.teams.insert(
            team,
            TeamRecord {
                members: vec![owner.clone()],
                owner,
            },
        );
        Ok(())
    }

    /// Adds an agent to an existing team.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownTeam`] when the team does not exist.
    pub fn add_member(&self, team: &TeamId, agent: AgentId) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let record = state
            .teams
            .get_mut(team)
            .ok_or_else(|| IdentityError::UnknownTeam(team.clone()))?;
        if !record.members.contains(&agent) {
            record.members.push(agent);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn tokens(&self, agent: &AgentId, channel: &ChannelName) -> IdentityResult<Vec<String>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .tokens
            .get(&(agent.clone(), channel.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_token(
        &self,
        agent: &AgentId,
        channel: &ChannelName,
        token: &str,
    ) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let tokens = state
            .tokens
            .entry((agent.clone(), channel.clone()))
            .or_default();
        if !tokens.iter().any(|existing| existing == token) {
            tokens.push(token.to_owned());
        }
        Ok(())
    }

    async fn remove_token(
        &self,
        agent: &AgentId,
        channel: &ChannelName,
        token: &str,
    ) -> IdentityResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(tokens) = state.tokens.get_mut(&(agent.clone(), channel.clone())) else {
            return Ok(false);
        };
        let before = tokens.len();
        tokens.retain(|existing| existing != token);
        Ok(tokens.len() != before)
    }

    async fn can_send_to(&self, from: &AgentId, to: &AgentId) -> IdentityResult<bool> {
        if from == to {
            return Ok(true);
        }
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .teams
            .values()
            .any(|team| team.owner == *from && team.members.contains(to)))
    }

    async fn team_members(&self, team: &TeamId) -> IdentityResult<Vec<AgentId>> {
        let state = self.state.read().map_err(lock_error)?;
        state
            .teams
            .get(team)
            .map(|record| record.members.clone())
            .ok_or_else(|| IdentityError::UnknownTeam(team.clone()))
    }
}
