//! Per-discriminant routing policy.
//!
//! Called from the control loop only. Every branch ends in a delivery, a
//! drop or an error frame to the sender; nothing here returns an error to
//! the loop.

use chrono::{DateTime, Utc};

use crate::auth;
use crate::hub::engine::{Hub, encode};
use crate::hub::event::{Content, Event, EventKind, GroupActivity};
use crate::persistence::{GroupId, Store, UserId};
use crate::transport::message::Frame;

const NOT_CONNECTED: &str = "You can only message users you follow or who follow you";
const SEND_FAILED: &str = "Message could not be sent, please try again";

impl<S> Hub<S>
where
    S: Store + ?Sized,
{
    pub(super) fn route(&self, event: Event) {
        let at = Utc::now();

        match &event.kind {
            EventKind::PresenceQuery => {
                if let Some(msg) = self.online_users_message() {
                    self.send_to(event.from, &msg);
                }
            }
            EventKind::Typing { to, .. } => {
                let to = *to;
                if let Some(msg) = encode(&event.to_frame(at)) {
                    if !self.send_to(to, &msg) {
                        tracing::trace!(from = event.from, to, "typing signal dropped");
                    }
                }
            }
            EventKind::Feed(_) | EventKind::Broadcast(_) => {
                if let Some(msg) = encode(&event.to_frame(at)) {
                    let delivered = self.send_to_all(&msg);
                    tracing::debug!(kind = event.wire_kind(), from = event.from, delivered, "broadcast");
                }
            }
            EventKind::Notification(_) => {
                if let Some(msg) = encode(&event.to_frame(at)) {
                    self.send_to_all_except(event.from, &msg);
                }
            }
            EventKind::GroupMessage { group_id, content } => {
                self.route_group_message(&event, *group_id, content, at);
            }
            EventKind::GroupActivity(activity) => {
                self.route_group_activity(&event, activity, at);
            }
            EventKind::PrivateMessage { to, content, .. } => {
                self.route_private_message(&event, *to, content, at);
            }
        }
    }

    fn route_group_message(
        &self,
        event: &Event,
        group_id: GroupId,
        content: &Content,
        at: DateTime<Utc>,
    ) {
        let from = event.from;
        match auth::is_accepted_member(self.store.as_ref(), group_id, from) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(from, group_id, "group message from non-member dropped");
                return;
            }
            Err(e) => {
                tracing::error!(from, group_id, error = %e, "membership check failed");
                return;
            }
        }

        match self
            .store
            .persist_group_message(group_id, from, &content.to_wire(), at)
        {
            Ok(()) => {}
            Err(e) if e.is_rejection() => {
                tracing::warn!(from, group_id, error = %e, "group message rejected by store");
                return;
            }
            Err(e) => {
                tracing::error!(from, group_id, error = %e, "failed to persist group message");
            }
        }

        let mut frame = event.to_frame(at);
        frame.username = Some(self.username_or_blank(from));
        self.send_to_group(group_id, &frame);
    }

    fn route_group_activity(&self, event: &Event, activity: &GroupActivity, at: DateTime<Utc>) {
        self.send_to_group(activity.group_id, &event.to_frame(at));
    }

    /// Fans `frame` out to the accepted members of `group_id` that are online.
    fn send_to_group(&self, group_id: GroupId, frame: &Frame) {
        let members = match auth::accepted_member_ids(self.store.as_ref(), group_id) {
            Ok(members) => members,
            Err(e) => {
                tracing::error!(group_id, error = %e, "failed to resolve group members");
                return;
            }
        };

        if let Some(msg) = encode(frame) {
            let delivered = self.send_to_users(&members, &msg);
            tracing::debug!(
                group_id,
                kind = %frame.kind,
                members = members.len(),
                delivered,
                "group fan-out"
            );
        }
    }

    fn route_private_message(
        &self,
        event: &Event,
        to: UserId,
        content: &Content,
        at: DateTime<Utc>,
    ) {
        let from = event.from;
        match auth::may_message(self.store.as_ref(), from, to) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(from, to, "private message between unconnected users refused");
                self.send_error(from, NOT_CONNECTED, at);
                return;
            }
            Err(e) => {
                tracing::error!(from, to, error = %e, "follow check failed");
                self.send_error(from, SEND_FAILED, at);
                return;
            }
        }

        if let Err(e) = self
            .store
            .persist_direct_message(from, to, &content.to_wire(), at)
        {
            tracing::error!(from, to, error = %e, "failed to persist private message");
        }

        let Some(msg) = encode(&event.to_frame(at)) else {
            return;
        };
        self.send_to(to, &msg);
        if from != to {
            self.send_to(from, &msg);
        }
    }

    fn send_error(&self, user_id: UserId, content: &str, at: DateTime<Utc>) {
        if let Some(msg) = encode(&Frame::error(content, at)) {
            self.send_to(user_id, &msg);
        }
    }
}
