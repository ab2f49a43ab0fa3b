//! User-Agent strings the recognition client rotates through, mirroring a
//! plausible spread of current Android handsets running the Shazam app.

pub static USER_AGENTS: &[&str] = &[
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 8 Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 8 Pro Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 8a Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel Fold Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel Tablet Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S921B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S926B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S928B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-F946B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-F731B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-A556B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-A356B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-G991B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 7 Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 7 Pro Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 15; Pixel 8 Build/UPP3.240422.014)",
    "Dalvik/2.1.0 (Linux; U; Android 15; Pixel 8 Pro Build/UPP3.240422.014)",
    "Dalvik/2.1.0 (Linux; U; Android 15; Pixel 8a Build/UPP3.240422.014)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-G781B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-A546B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S916B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S918B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 7a Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-M546B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-F946N Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-F731N Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S911B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-G736B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 15; Pixel Fold Build/UPP3.240422.014)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-X716B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-X916B Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-X916N Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 6a Build/UP1A.240405.002)",
    "Dalvik/2.1.0 (Linux; U; Android 14; SM-S908B Build/UP1A.240405.002)",
];
