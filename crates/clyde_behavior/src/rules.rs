//! Seed rules: the default rule set, in priority order.
//!
//! `{name}` in a pattern stands for the bot's name. The last rule answers
//! anything that mentions the bot at all.

use crate::rule::{BehaviorRule, Capability, Captures, Response, StoreRef};
use crate::session::Session;
use clyde_core::{ChannelPolicy, Incoming};
use std::sync::Arc;

/// Store of remembered job ideas.
pub const JOBS_STORE: &str = "jobs";
/// Store of things to do when bored.
pub const BORED_STORE: &str = "bored";

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lists the channels we hang out in.
struct ListChannels;

impl Capability for ListChannels {
    fn respond(
        &self,
        session: &mut Session,
        _msg: &Incoming,
        _captures: &Captures,
    ) -> Option<String> {
        let mut places = vec![format!("{} (home)", session.subs.home())];
        for (channel, policy) in session.subs.channels() {
            let note = match policy {
                ChannelPolicy::SilentListen => " (just listening)",
                ChannelPolicy::HomeOnly => " (answering at home)",
                ChannelPolicy::Everywhere => "",
            };
            places.push(format!("{}{}", channel, note));
        }
        Some(format!("I hang out in {}.", places.join(", ")))
    }

    fn name(&self) -> &'static str {
        "list_channels"
    }
}

/// Build the default rule set for a bot called `bot_name`.
pub fn seed_rules(bot_name: &str) -> Result<Vec<BehaviorRule>, regex::Error> {
    let rule = |name: &str, pattern: &str, response: Response| {
        BehaviorRule::new(name, pattern, bot_name, response)
    };

    Ok(vec![
        rule(
            "fight_if",
            r"if (?P<fight1>.+) and (?P<fight2>.+) (?:fought|got in|were in|had)",
            Response::Template(lines(&[
                "$fight1 would win, because",
                "$fight2 would win, because",
            ])),
        )?
        .chained(),
        rule(
            "fight_between",
            r"between (?P<fight1>.+) and (?P<fight2>.+[^,?])(?:,|\?|$| who| which| what)",
            Response::Template(lines(&[
                "$fight1 would win, because",
                "$fight2 would win, because",
            ])),
        )?
        .chained(),
        rule(
            "greeting",
            r"^(?:hi|hello|hey|howdy|greetings),? {name}\b|^{name}[,:]? (?:hi|hello|hey)\b",
            Response::Template(lines(&["hi $sender!", "hello, $sender.", "hey $sender :)"])),
        )?,
        rule(
            "mood_query",
            r"\b{name}\b.*\bhow (?:are you|do you feel)|\bhow (?:are you|do you feel)\b.*\b{name}\b",
            Response::MoodReport,
        )?,
        rule(
            "subscribe_join",
            r"^{name},? (?:please )?(?:join us|hang out here|talk here|stay here)",
            Response::Subscribe {
                policy: ChannelPolicy::Everywhere,
                ack: lines(&["ok, I'll hang out in $channel!", "yay, new friends!"]),
            },
        )?
        .authenticated(),
        rule(
            "subscribe_quiet",
            r"^{name},? (?:please )?(?:be quiet|shush|hush|just listen)",
            Response::Subscribe {
                policy: ChannelPolicy::SilentListen,
                ack: lines(&["ok, I'll just listen.", "fine."]),
            },
        )?
        .authenticated(),
        rule(
            "subscribe_home_only",
            r"^{name},? (?:please )?(?:only talk at home|answer at home|reply at home)",
            Response::Subscribe {
                policy: ChannelPolicy::HomeOnly,
                ack: lines(&["ok, I'll answer in $home."]),
            },
        )?
        .authenticated(),
        rule(
            "unsubscribe",
            r"^{name},? (?:please )?(?:leave|go away from here|unsubscribe)",
            Response::Unsubscribe {
                ack: lines(&["bye, $channel!", "ok, I'm leaving :("]),
            },
        )?
        .authenticated(),
        rule(
            "list_channels",
            r"^{name},? where do you (?:hang out|listen)",
            Response::Custom(Arc::new(ListChannels)),
        )?,
        rule(
            "remember_quote",
            r#"^{name},? remember that (?P<person>[\w.-]+) said:? "?(?P<quote>[^"]+)"?"#,
            Response::Remember {
                store: StoreRef::PersonIn("person".into()),
                capture: "quote".into(),
                ack: lines(&["ok, I'll remember that.", "got it."]),
            },
        )?
        .authenticated(),
        rule(
            "impersonate",
            r"\b{name},? (?:impersonate|do an impression of|pretend to be) (?P<person>[\w.-]+)",
            Response::Recall {
                store: StoreRef::PersonIn("person".into()),
                template: "$fact".into(),
                fallback: lines(&["I don't know what $person sounds like.", "who?"]),
            },
        )?,
        rule(
            "job_suggest",
            r"^{name},? you (?:could|should) (?:be|become) (?P<job>[^.!?]+)",
            Response::Remember {
                store: StoreRef::Named(JOBS_STORE.into()),
                capture: "job".into(),
                ack: lines(&["ooh, $job! I'll think about it.", "maybe someday."]),
            },
        )?
        .authenticated(),
        rule(
            "job_query",
            r"\b{name}\b.*\bwhat do you want to be\b|\bwhat do you want to be\b.*\b{name}\b",
            Response::Recall {
                store: StoreRef::Named(JOBS_STORE.into()),
                template: "I want to be $fact when I grow up.".into(),
                fallback: lines(&["I don't know yet.", "a turnip, probably."]),
            },
        )?,
        rule(
            "bored_teach",
            r"^{name},? (?:when you're bored|if you get bored),? (?:you (?:could|can|should) )?(?P<activity>[^.!?]+)",
            Response::Remember {
                store: StoreRef::Named(BORED_STORE.into()),
                capture: "activity".into(),
                ack: lines(&["ok, next time I'm bored I'll $activity."]),
            },
        )?
        .authenticated(),
        rule(
            "praise",
            r"\b(?:good|nice|clever) {name}\b|\b{name},? (?:you(?:'re| are)|is) (?:great|awesome|cute|the best)|\bthanks?,? {name}\b",
            Response::MoodUp(lines(&["thanks, $sender!", ":)", "aw, shucks."])),
        )?,
        rule(
            "insult",
            r"\b(?:bad|stupid|dumb) {name}\b|\b{name},? (?:you(?:'re| are)|is) (?:stupid|dumb|annoying|useless)|\b(?:shut up|go away),? {name}\b",
            Response::MoodDown(lines(&[":(", "sorry, $sender.", "hmph."])),
        )?,
        rule("babble", r"\b{name}\b", Response::Babble { tail: 2 })?,
    ])
}
