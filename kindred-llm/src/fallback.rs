//! Canned replies used when no backend answers.
//!
//! Rules are checked in order against the lowercased text; the first
//! rule with a matching keyword wins. Callers pass the trainer's words,
//! not a rendered prompt.

struct FallbackRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[FallbackRule] = &[
    FallbackRule {
        keywords: &["greeting", "hello", "hey"],
        reply: "*perks up and bounces over* Hi! You're here! *wiggles happily*",
    },
    FallbackRule {
        keywords: &["explore", "adventure"],
        reply: "*ears prick up with interest* Ooh, where? *looks at you curiously*",
    },
    FallbackRule {
        keywords: &["play", "game"],
        reply: "*runs in excited circles* Yes, yes! *pounces playfully*",
    },
    FallbackRule {
        keywords: &["food", "hungry", "berry"],
        reply: "*nose twitches* Is that for me? *looks up hopefully*",
    },
    FallbackRule {
        keywords: &["pet", "cuddle", "hug"],
        reply: "*nuzzles against you* Mmm... *settles in contentedly*",
    },
    FallbackRule {
        keywords: &["scared", "afraid"],
        reply: "*ears droop* I'm scared... *huddles close to you*",
    },
    FallbackRule {
        keywords: &["tired", "sleep", "nap"],
        reply: "*yawns widely* So sleepy... *curls up in a cozy ball*",
    },
    FallbackRule {
        keywords: &["happy", "joy"],
        reply: "*bounces with energy* This is the best! *whole body wiggles*",
    },
    FallbackRule {
        keywords: &["memory", "remember"],
        reply: "*tilts head thoughtfully* I think I remember... *gazes into the distance*",
    },
];

const GENERIC_REPLY: &str = "*watches you attentively* Hm? *tilts head curiously*";

/// Pick a canned reply for `prompt`.
#[must_use]
pub fn fallback_response(prompt: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map_or(GENERIC_REPLY, |rule| rule.reply)
}
