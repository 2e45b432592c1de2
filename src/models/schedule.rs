//! The fixed event program shown on the landing page.

use serde::Serialize;

/// One line of the event program.
#[derive(Serialize, Clone, Copy, Debug)]
pub struct ScheduleEntry {
    pub time: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const PROGRAM: [ScheduleEntry; 6] = [
    ScheduleEntry {
        time: "2:00 PM",
        title: "Guest Arrival & Welcome",
        description: "Join us as we gather to celebrate",
    },
    ScheduleEntry {
        time: "3:00 PM",
        title: "Ceremony Begins",
        description: "The exchange of vows",
    },
    ScheduleEntry {
        time: "4:00 PM",
        title: "Cocktail Hour",
        description: "Drinks and light refreshments",
    },
    ScheduleEntry {
        time: "5:30 PM",
        title: "Reception & Dinner",
        description: "Celebrate with food and music",
    },
    ScheduleEntry {
        time: "7:00 PM",
        title: "First Dance",
        description: "Our first dance as newlyweds",
    },
    ScheduleEntry {
        time: "7:30 PM",
        title: "Dancing & Celebration",
        description: "Party the night away",
    },
];

/// The event program in display order.
pub fn program() -> &'static [ScheduleEntry] {
    &PROGRAM
}
