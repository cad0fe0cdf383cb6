// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyboard-mash and noise detection.

/// Keyboard row runs (QWERTY and Kedmanee) that only appear when mashing keys.
const KEYBOARD_RUNS: &[&str] = &[
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "qwerty",
    "asdf",
    "zxcv",
    "ฟหกดสา",
    "ไำพะ",
    "ฟหกด",
    "กดสา",
];

/// Thai vowel signs. A Thai string with none of these cannot be a real word.
const THAI_VOWELS: &[char] = &[
    'ะ', 'ั', 'า', 'ำ', 'ิ', 'ี', 'ึ', 'ื', 'ุ', 'ู', 'เ', 'แ', 'โ', 'ใ', 'ไ', '็',
];

fn is_thai_consonant(c: char) -> bool {
    ('ก'..='ฮ').contains(&c)
}

/// Returns true for text that is almost certainly noise.
///
/// Texts of three characters or fewer are never flagged. Digits only count
/// when the whole message is one repeated digit, so budgets and phone
/// numbers pass.
pub fn is_gibberish(text: &str) -> bool {
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 3 {
        return false;
    }

    // Covers a message made of one repeated digit as well.
    if chars.len() >= 5 && chars.iter().all(|c| *c == chars[0]) {
        return true;
    }

    let lower = text.to_lowercase();
    if KEYBOARD_RUNS.iter().any(|run| lower.contains(run)) {
        return true;
    }

    if !chars.iter().any(|c| THAI_VOWELS.contains(c))
        && longest_run(&chars, |c| is_thai_consonant(*c)) >= 5
    {
        return true;
    }

    false
}

fn longest_run(chars: &[char], pred: impl Fn(&char) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in chars {
        if pred(c) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flags_keyboard_mashing() {
        assert!(is_gibberish("asdfasdf"));
        assert!(is_gibberish("QWERTY!!"));
        assert!(is_gibberish("ฟหกดสาว"));
    }

    #[test]
    fn flags_vowelless_thai_consonant_runs() {
        assert!(is_gibberish("กขคงจฉ"));
        // Same consonants broken up by vowels read as words.
        assert!(!is_gibberish("กาขีคู"));
    }

    #[test]
    fn flags_a_message_of_one_repeated_digit() {
        assert!(is_gibberish("55555555"));
        assert!(is_gibberish(" 999999 "));
        assert!(!is_gibberish("0812345678"));
        assert!(!is_gibberish("12345"));
    }

    #[test]
    fn amounts_and_phone_numbers_pass() {
        for text in [
            "งบ 1000000 บาท",
            "โอนแล้ว 2000000",
            "0899999999",
            "สนใจ rolex งบ 1,000000",
            "call 0999999",
        ] {
            assert!(!is_gibberish(text), "{text}");
        }
    }

    #[test]
    fn real_messages_pass() {
        for text in [
            "สนใจ rolex submariner ครับ",
            "นาฬิกาโรเล็กซ์สีเขียว",
            "ราคาเท่าไหร่คะ",
            "RLX-0012",
            "ok",
        ] {
            assert!(!is_gibberish(text), "{text}");
        }
    }

    proptest! {
        #[test]
        fn short_text_is_never_gibberish(text in "\\PC{0,3}") {
            prop_assume!(text.trim().chars().count() <= 3);
            prop_assert!(!is_gibberish(&text));
        }

        #[test]
        fn five_identical_chars_are_gibberish(
            c in any::<char>().prop_filter("visible", |c| !c.is_whitespace() && !c.is_control()),
            extra in 0usize..20,
        ) {
            let text: String = std::iter::repeat_n(c, 5 + extra).collect();
            prop_assert!(is_gibberish(&text));
        }
    }
}
