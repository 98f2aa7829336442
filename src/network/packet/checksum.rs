/// インターネットチェックサム (RFC 1071)
///
/// 16ビットのビッグエンディアンワードの1の補数和を取り、その補数を返す。
/// 長さが奇数の場合、最後のバイトは下位をゼロ埋めしたワードとして扱う。
/// チェックサムフィールド自体はゼロにしてから呼び出すこと。
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u64;

    // 16ビット単位で合計を計算
    for chunk in data.chunks(2) {
        let mut word = (chunk[0] as u64) << 8;
        if chunk.len() > 1 {
            word |= chunk[1] as u64;
        }
        sum += word;
    }

    // 上位ビットを下位16ビットに折り返す
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    // 1の補数を取る
    !(sum as u16)
}
